pub(crate) fn header<'a>(line: &'a [u8], name: &[u8]) -> Option<&'a [u8]> {
    if line.contains(&b' ') {
        let (maybe_name, value) = split_once(line, &b' ');
        if maybe_name == name {
            Some(value)
        } else {
            None
        }
    } else {
        None
    }
}

pub(crate) fn split_once<'a>(s: &'a [u8], c: &u8) -> (&'a [u8], &'a [u8]) {
    match s.iter().position(|b| b == c) {
        Some(n) => (&s[0..n], &s[n + 1..]),
        None => (s, &[]),
    }
}

/// Split off the first line (without its `\n`). Returns `None` at end of input.
pub(crate) fn next_line(s: &[u8]) -> Option<(&[u8], &[u8])> {
    if s.is_empty() {
        None
    } else {
        Some(split_once(s, &b'\n'))
    }
}
