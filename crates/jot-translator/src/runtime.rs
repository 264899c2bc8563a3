//! Runtime helper registry.
//!
//! The emitted JavaScript leans on a small library of helper functions:
//! the slice and map representations, the cooperative scheduler and
//! channels, pointer boxes, deferred-call stacks, and type assertions.
//! Each fragment the translator produces records which helpers it needs;
//! the bundler injects only those, once, ahead of the first module.
//!
//! Helpers are emitted in the fixed order of the `Helper` enum so output
//! stays byte-identical across runs.

use std::collections::BTreeSet;

/// One injectable runtime unit. Ordering is emission ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Helper {
    /// `var $mtab = {};` — the method table keyed by runtime type tag.
    Mtab,
    /// Panic: throws an Error carrying the panic value.
    Panic,
    /// Run queue: `$go`, `$step`, `$block`.
    Sched,
    /// Slice record and bounds-checked element access.
    SliceCore,
    /// `$subslice` — slicing with capacity tracking.
    Subslice,
    /// `$append`.
    Append,
    /// `$copy`.
    Copy,
    /// `$makeslice`.
    MakeSlice,
    /// `$toarray` — flatten a slice to a plain array (spread calls).
    ToArray,
    /// String/byte-slice conversions.
    StrBytes,
    /// `$zeroarray` — zero-filled fixed arrays.
    ZeroArray,
    /// Map record with boxed keys.
    MapCore,
    /// `$mapiter` — deterministic map iteration.
    MapIter,
    /// Channels: `$chan`, `$send`, `$recv`, `$recv2`, `$close`.
    Chan,
    /// `$select`.
    Select,
    /// Interface dispatch through the method table.
    Imethod,
    /// Pointer boxes: `$boxref`, `$fieldref`, `$indexref`.
    Ref,
    /// Deferred-call stacks: `$defer`, `$rundefers`.
    Defer,
    /// Concrete type assertions.
    Assert,
    /// Interface type assertions.
    IfaceAssert,
    /// Truncating division for wide integers and float-to-int conversion.
    Div,
    /// `$print` / `$println`.
    Print,
}

impl Helper {
    /// Helpers this helper's source depends on.
    fn deps(self) -> &'static [Helper] {
        match self {
            Self::SliceCore => &[Self::Panic],
            Self::Subslice | Self::Append | Self::Copy | Self::MakeSlice | Self::ToArray => {
                &[Self::SliceCore]
            }
            Self::StrBytes => &[Self::SliceCore],
            Self::Chan => &[Self::Sched, Self::Panic],
            Self::Select => &[Self::Sched],
            Self::Imethod => &[Self::Mtab],
            Self::Ref => &[Self::SliceCore],
            Self::Assert => &[Self::Panic],
            Self::IfaceAssert => &[Self::Mtab, Self::Panic],
            _ => &[],
        }
    }

    /// Verbatim JavaScript source for this helper.
    pub fn source(self) -> &'static str {
        match self {
            Self::Mtab => "var $mtab = {};",
            Self::Panic => {
                "function $panic(v) {\n  var e = new Error(\"panic: \" + v);\n  e.$panic = v;\n  throw e;\n}"
            }
            Self::Sched => {
                "var $tasks = [];\nfunction $go(fn, args) {\n  $tasks.push(function () { fn.apply(undefined, args); });\n}\nfunction $step() {\n  if ($tasks.length === 0) {\n    return false;\n  }\n  var task = $tasks.shift();\n  task();\n  return true;\n}\nfunction $block() {\n  if (!$step()) {\n    throw new Error(\"deadlock: all tasks are blocked\");\n  }\n}"
            }
            Self::SliceCore => {
                "function $slice(array, offset, length, capacity) {\n  return { array: array, offset: offset, length: length, capacity: capacity };\n}\nfunction $slen(s) {\n  return s === null ? 0 : s.length;\n}\nfunction $scap(s) {\n  return s === null ? 0 : s.capacity;\n}\nfunction $index(s, i) {\n  if (s === null || i < 0 || i >= s.length) {\n    $panic(\"index out of range\");\n  }\n  return s.array[s.offset + i];\n}\nfunction $setindex(s, i, v) {\n  if (s === null || i < 0 || i >= s.length) {\n    $panic(\"index out of range\");\n  }\n  s.array[s.offset + i] = v;\n}\nfunction $arrslice(a) {\n  return $slice(a, 0, a.length, a.length);\n}"
            }
            Self::Subslice => {
                "function $subslice(s, lo, hi, max) {\n  if (s === null) {\n    s = $slice([], 0, 0, 0);\n  }\n  if (hi === null) {\n    hi = s.length;\n  }\n  if (max === null) {\n    max = s.capacity;\n  }\n  if (lo < 0 || hi < lo || max < hi || max > s.capacity) {\n    $panic(\"slice bounds out of range\");\n  }\n  return $slice(s.array, s.offset + lo, hi - lo, max - lo);\n}"
            }
            Self::Append => {
                "function $append(s) {\n  var items = Array.prototype.slice.call(arguments, 1);\n  if (s === null) {\n    s = $slice([], 0, 0, 0);\n  }\n  var len = s.length + items.length;\n  if (len > s.capacity) {\n    var array = new Array(len < 8 ? 8 : len * 2);\n    for (var i = 0; i < s.length; i++) {\n      array[i] = s.array[s.offset + i];\n    }\n    s = $slice(array, 0, s.length, array.length);\n  }\n  for (var j = 0; j < items.length; j++) {\n    s.array[s.offset + s.length + j] = items[j];\n  }\n  return $slice(s.array, s.offset, len, s.capacity);\n}"
            }
            Self::Copy => {
                "function $copy(dst, src) {\n  var n = $slen(dst) < $slen(src) ? $slen(dst) : $slen(src);\n  for (var i = 0; i < n; i++) {\n    dst.array[dst.offset + i] = src.array[src.offset + i];\n  }\n  return n;\n}"
            }
            Self::MakeSlice => {
                "function $makeslice(len, cap, zero) {\n  if (cap === null) {\n    cap = len;\n  }\n  var array = new Array(cap);\n  for (var i = 0; i < len; i++) {\n    array[i] = zero();\n  }\n  return $slice(array, 0, len, cap);\n}"
            }
            Self::ToArray => {
                "function $toarray(s) {\n  var out = new Array($slen(s));\n  for (var i = 0; i < out.length; i++) {\n    out[i] = s.array[s.offset + i];\n  }\n  return out;\n}"
            }
            Self::StrBytes => {
                "function $stringtobytes(s) {\n  var array = new Array(s.length);\n  for (var i = 0; i < s.length; i++) {\n    array[i] = s.charCodeAt(i);\n  }\n  return $slice(array, 0, array.length, array.length);\n}\nfunction $bytestostring(s) {\n  var out = \"\";\n  for (var i = 0; i < $slen(s); i++) {\n    out += String.fromCharCode(s.array[s.offset + i]);\n  }\n  return out;\n}"
            }
            Self::ZeroArray => {
                "function $zeroarray(len, zero) {\n  var out = new Array(len);\n  for (var i = 0; i < len; i++) {\n    out[i] = zero();\n  }\n  return out;\n}"
            }
            Self::MapCore => {
                "function $mapkey(k) {\n  if (typeof k === \"string\") {\n    return \"s$\" + k;\n  }\n  if (k !== null && typeof k === \"object\") {\n    return \"o$\" + JSON.stringify(k);\n  }\n  return \"v$\" + k;\n}\nfunction $mapmake() {\n  return { keys: {}, size: 0 };\n}\nfunction $mapset(m, k, v) {\n  var h = $mapkey(k);\n  if (!(h in m.keys)) {\n    m.size++;\n  }\n  m.keys[h] = { key: k, value: v };\n}\nfunction $mapget(m, k, zero) {\n  if (m === null) {\n    return zero;\n  }\n  var e = m.keys[$mapkey(k)];\n  return e === undefined ? zero : e.value;\n}\nfunction $mapget2(m, k, zero) {\n  if (m === null) {\n    return [zero, false];\n  }\n  var e = m.keys[$mapkey(k)];\n  return e === undefined ? [zero, false] : [e.value, true];\n}\nfunction $mapdelete(m, k) {\n  if (m === null) {\n    return;\n  }\n  var h = $mapkey(k);\n  if (h in m.keys) {\n    delete m.keys[h];\n    m.size--;\n  }\n}\nfunction $maplen(m) {\n  return m === null ? 0 : m.size;\n}\nfunction $maplit(pairs) {\n  var m = $mapmake();\n  for (var i = 0; i < pairs.length; i++) {\n    $mapset(m, pairs[i][0], pairs[i][1]);\n  }\n  return m;\n}"
            }
            Self::MapIter => {
                "function $mapiter(m) {\n  if (m === null) {\n    return [];\n  }\n  var hashes = [];\n  for (var h in m.keys) {\n    hashes.push(h);\n  }\n  hashes.sort();\n  var out = new Array(hashes.length);\n  for (var i = 0; i < hashes.length; i++) {\n    out[i] = m.keys[hashes[i]];\n  }\n  return out;\n}"
            }
            Self::Chan => {
                "function $chan(cap) {\n  return { buf: [], cap: cap > 0 ? cap : 1, closed: false };\n}\nfunction $send(ch, v) {\n  if (ch.closed) {\n    $panic(\"send on closed channel\");\n  }\n  while (ch.buf.length >= ch.cap) {\n    $block();\n    if (ch.closed) {\n      $panic(\"send on closed channel\");\n    }\n  }\n  ch.buf.push(v);\n}\nfunction $recv(ch, zero) {\n  while (ch.buf.length === 0 && !ch.closed) {\n    $block();\n  }\n  return ch.buf.length === 0 ? zero : ch.buf.shift();\n}\nfunction $recv2(ch, zero) {\n  while (ch.buf.length === 0 && !ch.closed) {\n    $block();\n  }\n  return ch.buf.length === 0 ? [zero, false] : [ch.buf.shift(), true];\n}\nfunction $close(ch) {\n  ch.closed = true;\n}"
            }
            Self::Select => {
                "function $select(cases, hasDefault) {\n  for (;;) {\n    for (var i = 0; i < cases.length; i++) {\n      if (cases[i]()) {\n        return i;\n      }\n    }\n    if (hasDefault) {\n      return -1;\n    }\n    $block();\n  }\n}"
            }
            Self::Imethod => {
                "function $imethod(v, name) {\n  return $mtab[v.$type][name];\n}\nfunction $icall(v, name, args) {\n  return $mtab[v.$type][name].apply(undefined, [v].concat(args));\n}"
            }
            Self::Ref => {
                "function $boxref(v) {\n  return {\n    get: function () { return v; },\n    set: function (n) { v = n; }\n  };\n}\nfunction $fieldref(o, f) {\n  return {\n    get: function () { return o[f]; },\n    set: function (v) { o[f] = v; }\n  };\n}\nfunction $indexref(s, i) {\n  return {\n    get: function () { return $index(s, i); },\n    set: function (v) { $setindex(s, i, v); }\n  };\n}"
            }
            Self::Defer => {
                "function $defer(list, fn, args) {\n  list.push(function () { fn.apply(undefined, args); });\n}\nfunction $rundefers(list) {\n  for (var i = list.length - 1; i >= 0; i--) {\n    list[i]();\n  }\n}"
            }
            Self::Assert => {
                "function $assert(v, tag) {\n  if (v === null || v.$type !== tag) {\n    $panic(\"interface conversion to \" + tag);\n  }\n  return v;\n}\nfunction $assert2(v, tag, zero) {\n  return v !== null && v.$type === tag ? [v, true] : [zero, false];\n}"
            }
            Self::IfaceAssert => {
                "function $implements(v, names) {\n  if (v === null || v.$type === undefined) {\n    return false;\n  }\n  var table = $mtab[v.$type];\n  if (!table) {\n    return false;\n  }\n  for (var i = 0; i < names.length; i++) {\n    if (!table[names[i]]) {\n      return false;\n    }\n  }\n  return true;\n}\nfunction $iassert(v, names) {\n  if (!$implements(v, names)) {\n    $panic(\"interface conversion\");\n  }\n  return v;\n}\nfunction $iassert2(v, names, zero) {\n  return $implements(v, names) ? [v, true] : [zero, false];\n}"
            }
            Self::Div => {
                "function $div(a, b) {\n  var q = a / b;\n  return q < 0 ? Math.ceil(q) : Math.floor(q);\n}"
            }
            Self::Print => {
                "function $print() {\n  console.log(Array.prototype.join.call(arguments, \"\"));\n}\nfunction $println() {\n  console.log(Array.prototype.join.call(arguments, \" \"));\n}"
            }
        }
    }

    /// Every helper, in emission order.
    pub fn all() -> &'static [Helper] {
        &[
            Self::Mtab,
            Self::Panic,
            Self::Sched,
            Self::SliceCore,
            Self::Subslice,
            Self::Append,
            Self::Copy,
            Self::MakeSlice,
            Self::ToArray,
            Self::StrBytes,
            Self::ZeroArray,
            Self::MapCore,
            Self::MapIter,
            Self::Chan,
            Self::Select,
            Self::Imethod,
            Self::Ref,
            Self::Defer,
            Self::Assert,
            Self::IfaceAssert,
            Self::Div,
            Self::Print,
        ]
    }
}

/// The set of helpers a translated fragment needs. Ordered so union and
/// emission are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HelperSet {
    used: BTreeSet<Helper>,
}

impl HelperSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, helper: Helper) {
        self.used.insert(helper);
    }

    pub fn extend(&mut self, other: &HelperSet) {
        self.used.extend(other.used.iter().copied());
    }

    pub fn is_empty(&self) -> bool {
        self.used.is_empty()
    }

    pub fn contains(&self, helper: Helper) -> bool {
        self.used.contains(&helper)
    }

    /// The used helpers with dependencies expanded, in emission order.
    pub fn closure(&self) -> Vec<Helper> {
        let mut closed: BTreeSet<Helper> = BTreeSet::new();
        let mut queue: Vec<Helper> = self.used.iter().copied().collect();
        while let Some(helper) = queue.pop() {
            if closed.insert(helper) {
                queue.extend_from_slice(helper.deps());
            }
        }
        Helper::all()
            .iter()
            .copied()
            .filter(|h| closed.contains(h))
            .collect()
    }
}
