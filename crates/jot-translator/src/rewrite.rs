//! `jsrewrite` template parsing and substitution.
//!
//! A template is a JavaScript expression with placeholders: `$_` for the
//! method receiver, `$<` for the receiver used as an assignment target,
//! and `$1`..`$n` for positional arguments. At a call site whose callee
//! carries a template, the translator substitutes the template in place of
//! a normal call, splicing in the already-translated argument text.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    Text(String),
    /// `$_` — the receiver.
    Recv,
    /// `$<` — the receiver as the immediate left-hand side.
    Lhs,
    /// `$N` — zero-based positional argument.
    Arg(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    parts: Vec<Part>,
}

impl Template {
    /// Parse a raw template string. Fails on a dangling `$`, `$0`, or a
    /// `$` followed by anything other than `_`, `<` or digits.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let mut parts = Vec::new();
        let mut text = String::new();
        let mut chars = raw.chars().peekable();

        while let Some(c) = chars.next() {
            if c != '$' {
                text.push(c);
                continue;
            }
            match chars.peek() {
                Some('_') => {
                    chars.next();
                    flush(&mut parts, &mut text);
                    parts.push(Part::Recv);
                }
                Some('<') => {
                    chars.next();
                    flush(&mut parts, &mut text);
                    parts.push(Part::Lhs);
                }
                Some(d) if d.is_ascii_digit() => {
                    let mut num = String::new();
                    while let Some(d) = chars.peek() {
                        if !d.is_ascii_digit() {
                            break;
                        }
                        num.push(*d);
                        chars.next();
                    }
                    let n: usize = num
                        .parse()
                        .map_err(|_| format!("placeholder ${num} is not a number"))?;
                    if n == 0 {
                        return Err("placeholder $0 is invalid; arguments start at $1".into());
                    }
                    flush(&mut parts, &mut text);
                    parts.push(Part::Arg(n - 1));
                }
                Some(other) => {
                    return Err(format!("malformed placeholder $ followed by {other:?}"));
                }
                None => {
                    return Err("dangling $ at end of template".into());
                }
            }
        }
        flush(&mut parts, &mut text);
        Ok(Self { parts })
    }

    /// Whether the template references the receiver (`$_` or `$<`).
    pub fn uses_receiver(&self) -> bool {
        self.parts
            .iter()
            .any(|p| matches!(p, Part::Recv | Part::Lhs))
    }

    /// Substitute placeholders with already-printed JS expression text.
    pub fn substitute(&self, recv: Option<&str>, args: &[String]) -> Result<String, String> {
        let mut out = String::new();
        for part in &self.parts {
            match part {
                Part::Text(text) => out.push_str(text),
                Part::Recv | Part::Lhs => match recv {
                    Some(recv) => out.push_str(recv),
                    None => {
                        return Err("template references a receiver, but the call has none".into());
                    }
                },
                Part::Arg(i) => match args.get(*i) {
                    Some(arg) => out.push_str(arg),
                    None => {
                        return Err(format!(
                            "placeholder ${} out of range: call has {} argument(s)",
                            i + 1,
                            args.len()
                        ));
                    }
                },
            }
        }
        Ok(out)
    }
}

fn flush(parts: &mut Vec<Part>, text: &mut String) {
    if !text.is_empty() {
        parts.push(Part::Text(std::mem::take(text)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_positional_placeholders() {
        let t = Template::parse("document.createElement($1)").unwrap();
        assert_eq!(
            t.substitute(None, &["\"div\"".into()]).unwrap(),
            "document.createElement(\"div\")"
        );
    }

    #[test]
    fn parses_receiver_placeholders() {
        let t = Template::parse("$_.item($1)").unwrap();
        assert!(t.uses_receiver());
        assert_eq!(
            t.substitute(Some("plugins"), &["0".into()]).unwrap(),
            "plugins.item(0)"
        );

        let t = Template::parse("$<.nodeName").unwrap();
        assert_eq!(t.substitute(Some("e"), &[]).unwrap(), "e.nodeName");
    }

    #[test]
    fn multi_argument_template() {
        let t = Template::parse("$_.initEvent($1, $2, $3)").unwrap();
        let args = vec!["\"click\"".to_string(), "true".into(), "false".into()];
        assert_eq!(
            t.substitute(Some("ev"), &args).unwrap(),
            "ev.initEvent(\"click\", true, false)"
        );
    }

    #[test]
    fn rejects_malformed_templates() {
        assert!(Template::parse("foo($").is_err());
        assert!(Template::parse("foo($x)").is_err());
        assert!(Template::parse("foo($0)").is_err());
    }

    #[test]
    fn out_of_range_placeholder_fails_substitution() {
        let t = Template::parse("f($2)").unwrap();
        let err = t.substitute(None, &["1".into()]).unwrap_err();
        assert!(err.contains("$2"));
    }

    #[test]
    fn missing_receiver_fails_substitution() {
        let t = Template::parse("$_.x").unwrap();
        assert!(t.substitute(None, &[]).is_err());
    }
}
