//! Shared walker-check harness for the combinatorial suites.
//!
//! Each suite builds a store (or stack of stores) from a short op string over
//! its own alphabet, together with the expected ordered view, then runs every
//! traversal pattern against a walker. Cases are generated exhaustively per
//! length, so the suites sweep every layering of present, shadowed and
//! deleted keys the alphabet can express.

// each suite links its own copy and uses its own subset
#![allow(dead_code)]

use laminadb::Walker;

/// Expected ordered key/value view of a store under test.
pub type Expected = Vec<(Vec<u8>, Vec<u8>)>;

/// All op strings of exactly `len` symbols over `alphabet`.
pub fn cases(alphabet: &[u8], len: usize) -> Vec<Vec<u8>> {
    let mut out = vec![Vec::new()];
    for _ in 0..len {
        let mut grown = Vec::with_capacity(out.len() * alphabet.len());
        for stem in &out {
            for &symbol in alphabet {
                let mut case = stem.clone();
                case.push(symbol);
                grown.push(case);
            }
        }
        out = grown;
    }
    out
}

/// All op strings of the suite's standard lengths (0 through 3, plus 5).
pub fn standard_cases(alphabet: &[u8]) -> Vec<Vec<u8>> {
    let mut out = Vec::new();
    for len in [0, 1, 2, 3, 5] {
        out.extend(cases(alphabet, len));
    }
    out
}

fn context(case: &[u8], pattern: &str) -> String {
    format!(
        "case {:?}, pattern {}",
        String::from_utf8_lossy(case),
        pattern
    )
}

fn expect_at<W: Walker>(w: &W, entry: &(Vec<u8>, Vec<u8>), ctx: &str) {
    assert!(w.valid(), "{ctx}: walker invalid, expected {:?}", entry);
    assert!(w.status().is_ok(), "{ctx}: status not ok");
    assert_eq!(
        w.key().unwrap(),
        entry.0,
        "{ctx}: wrong key, expected {:?}",
        String::from_utf8_lossy(&entry.0)
    );
    assert_eq!(
        w.value().unwrap(),
        entry.1,
        "{ctx}: wrong value at key {:?}",
        String::from_utf8_lossy(&entry.0)
    );
}

fn expect_spent<W: Walker>(w: &W, ctx: &str) {
    assert!(
        !w.valid(),
        "{ctx}: walker still points at {:?}",
        w.key().map(|k| String::from_utf8_lossy(&k).into_owned())
    );
    assert!(w.status().is_err(), "{ctx}: spent walker reported ok");
}

pub fn forward<W: Walker>(w: &mut W, e: &Expected, case: &[u8]) {
    let ctx = context(case, "forward");
    w.seek_to_first();
    for entry in e {
        expect_at(w, entry, &ctx);
        w.next();
    }
    expect_spent(w, &ctx);
}

pub fn backward<W: Walker>(w: &mut W, e: &Expected, case: &[u8]) {
    let ctx = context(case, "backward");
    w.seek_to_last();
    for entry in e.iter().rev() {
        expect_at(w, entry, &ctx);
        w.prev();
    }
    expect_spent(w, &ctx);
}

pub fn seek_first_prev<W: Walker>(w: &mut W, e: &Expected, case: &[u8]) {
    if e.is_empty() {
        return;
    }
    let ctx = context(case, "seek_first_prev");
    w.seek_to_first();
    expect_at(w, &e[0], &ctx);
    w.prev();
    expect_spent(w, &ctx);
}

pub fn seek_last_next<W: Walker>(w: &mut W, e: &Expected, case: &[u8]) {
    if e.is_empty() {
        return;
    }
    let ctx = context(case, "seek_last_next");
    w.seek_to_last();
    expect_at(w, &e[e.len() - 1], &ctx);
    w.next();
    expect_spent(w, &ctx);
}

pub fn sawtooth_forward<W: Walker>(w: &mut W, e: &Expected, case: &[u8]) {
    if e.len() < 2 {
        return;
    }
    let ctx = context(case, "sawtooth_forward");
    w.seek_to_first();
    expect_at(w, &e[0], &ctx);
    w.next();

    let mut i = 1;
    while i < e.len() {
        expect_at(w, &e[i], &ctx);
        w.prev();
        expect_at(w, &e[i - 1], &ctx);
        w.next();
        w.next();
        i += 1;
    }
    expect_spent(w, &ctx);
}

pub fn sawtooth_backward<W: Walker>(w: &mut W, e: &Expected, case: &[u8]) {
    if e.len() < 2 {
        return;
    }
    let ctx = context(case, "sawtooth_backward");
    let rev: Expected = e.iter().rev().cloned().collect();
    w.seek_to_last();
    expect_at(w, &rev[0], &ctx);
    w.prev();

    let mut i = 1;
    while i < rev.len() {
        expect_at(w, &rev[i], &ctx);
        w.next();
        expect_at(w, &rev[i - 1], &ctx);
        w.prev();
        w.prev();
        i += 1;
    }
    expect_spent(w, &ctx);
}

pub fn seek_for_first<W: Walker>(w: &mut W, e: &Expected, case: &[u8]) {
    if e.is_empty() {
        return;
    }
    let ctx = context(case, "seek_for_first");
    w.seek(&e[0].0);
    expect_at(w, &e[0], &ctx);
}

pub fn seek_for_last<W: Walker>(w: &mut W, e: &Expected, case: &[u8]) {
    if e.is_empty() {
        return;
    }
    let ctx = context(case, "seek_for_last");
    w.seek(&e[e.len() - 1].0);
    expect_at(w, &e[e.len() - 1], &ctx);
}

pub fn seek_for_third<W: Walker>(w: &mut W, e: &Expected, case: &[u8]) {
    if e.len() < 3 {
        return;
    }
    let ctx = context(case, "seek_for_third");
    w.seek(&e[2].0);
    expect_at(w, &e[2], &ctx);
}

/// Seek just past the third present key: lands on the fourth, or runs off the
/// end when there is none.
pub fn seek_fuzzy_fourth<W: Walker>(w: &mut W, e: &Expected, case: &[u8]) {
    if e.len() < 3 {
        return;
    }
    let ctx = context(case, "seek_fuzzy_fourth");
    let mut target = e[2].0.clone();
    target.push(b'1');
    w.seek(&target);

    if e.len() == 3 {
        expect_spent(w, &ctx);
    } else {
        expect_at(w, &e[3], &ctx);
    }
}

/// Seek before every possible key.
pub fn seek_fuzzy_first<W: Walker>(w: &mut W, e: &Expected, case: &[u8]) {
    let ctx = context(case, "seek_fuzzy_first");
    w.seek(b"0");
    if e.is_empty() {
        expect_spent(w, &ctx);
    } else {
        expect_at(w, &e[0], &ctx);
    }
}

/// Seek past every possible key.
pub fn seek_fuzzy_max<W: Walker>(w: &mut W, e: &Expected, case: &[u8]) {
    let ctx = context(case, "seek_fuzzy_max");
    w.seek(b"zzz");
    expect_spent(w, &ctx);
}

/// Run every traversal pattern against one walker.
pub fn check_all<W: Walker>(w: &mut W, e: &Expected, case: &[u8]) {
    forward(w, e, case);
    backward(w, e, case);
    seek_first_prev(w, e, case);
    seek_last_next(w, e, case);
    sawtooth_forward(w, e, case);
    sawtooth_backward(w, e, case);
    seek_for_first(w, e, case);
    seek_for_last(w, e, case);
    seek_for_third(w, e, case);
    seek_fuzzy_fourth(w, e, case);
    seek_fuzzy_first(w, e, case);
    seek_fuzzy_max(w, e, case);
}
