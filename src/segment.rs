//! Character trie backing one lexicon.
//!
//! Nodes live in an append-only arena addressed by `u32` index; node 0 is the
//! root. Nodes are never removed or moved, so an index handed out inside a
//! [`Hit`] stays valid for the life of the segment. Entries are retired by
//! flipping a per-node `disabled` flag, which keeps longer entries that share
//! the prefix reachable.
//!
//! Readers take a shared lock for the duration of one walk; a writer takes the
//! exclusive lock for one entry at a time, so a walk sees either the shape
//! before an insertion or the shape after it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use parking_lot::RwLock;

use crate::hit::{Hit, HitStatus, NodeRef};

/// Children are kept in a sorted array until this many, then moved to a map.
const ARRAY_LENGTH_LIMIT: usize = 3;

const ROOT: u32 = 0;

static NEXT_SEGMENT_ID: AtomicU32 = AtomicU32::new(1);

enum Children {
    Array(Vec<(char, u32)>),
    Map(HashMap<char, u32>),
}

impl Children {
    #[inline]
    fn get(&self, ch: char) -> Option<u32> {
        match self {
            Children::Array(arr) => arr
                .binary_search_by_key(&ch, |&(k, _)| k)
                .ok()
                .map(|i| arr[i].1),
            Children::Map(map) => map.get(&ch).copied(),
        }
    }

    fn insert(&mut self, ch: char, idx: u32) {
        match self {
            Children::Array(arr) => {
                if let Err(pos) = arr.binary_search_by_key(&ch, |&(k, _)| k) {
                    if arr.len() < ARRAY_LENGTH_LIMIT {
                        arr.insert(pos, (ch, idx));
                    } else {
                        let mut map: HashMap<char, u32> = arr.drain(..).collect();
                        map.insert(ch, idx);
                        *self = Children::Map(map);
                    }
                }
            }
            Children::Map(map) => {
                map.entry(ch).or_insert(idx);
            }
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            Children::Array(arr) => arr.is_empty(),
            Children::Map(map) => map.is_empty(),
        }
    }

    fn sorted(&self) -> Vec<(char, u32)> {
        match self {
            Children::Array(arr) => arr.clone(),
            Children::Map(map) => {
                let mut v: Vec<(char, u32)> = map.iter().map(|(&k, &v)| (k, v)).collect();
                v.sort_unstable_by_key(|&(k, _)| k);
                v
            }
        }
    }
}

struct Node {
    word: bool,
    disabled: AtomicBool,
    children: Children,
}

impl Node {
    fn new() -> Self {
        Node {
            word: false,
            disabled: AtomicBool::new(false),
            children: Children::Array(Vec::new()),
        }
    }

    #[inline]
    fn is_live_word(&self) -> bool {
        self.word && !self.disabled.load(Ordering::Acquire)
    }
}

pub struct Segment {
    id: u32,
    nodes: RwLock<Vec<Node>>,
}

impl Default for Segment {
    fn default() -> Self {
        Self::new()
    }
}

impl Segment {
    pub fn new() -> Self {
        Segment {
            id: NEXT_SEGMENT_ID.fetch_add(1, Ordering::Relaxed),
            nodes: RwLock::new(vec![Node::new()]),
        }
    }

    /// Walks `length` characters of `buffer` starting at `begin` from the root.
    ///
    /// A zero-length or out-of-range window is unmatched.
    pub fn match_at(&self, buffer: &[char], begin: usize, length: usize) -> Hit {
        self.walk(ROOT, buffer, begin, length, begin)
    }

    /// Continues a walk from the node recorded in `prior`.
    ///
    /// The returned hit keeps `prior.begin()` and counts every character
    /// consumed since then. Fails as unmatched when `prior` is not resumable
    /// or came from another segment.
    pub fn match_from(&self, buffer: &[char], begin: usize, length: usize, prior: &Hit) -> Hit {
        match prior.resume_point() {
            Some(node) if node.owner == self.id => self.walk(node.index, buffer, begin, length, prior.begin()),
            _ => Hit::unmatched(prior.begin(), prior.len()),
        }
    }

    fn walk(&self, from: u32, buffer: &[char], begin: usize, length: usize, hit_begin: usize) -> Hit {
        let window = match begin.checked_add(length) {
            Some(end) if length > 0 && end <= buffer.len() => &buffer[begin..end],
            _ => return Hit::unmatched(hit_begin, begin.saturating_sub(hit_begin)),
        };

        let nodes = self.nodes.read();
        let mut cur = from;
        for (i, &ch) in window.iter().enumerate() {
            match nodes[cur as usize].children.get(ch) {
                Some(next) => cur = next,
                None => return Hit::unmatched(hit_begin, (begin + i).saturating_sub(hit_begin)),
            }
        }

        let node = &nodes[cur as usize];
        let mut status = HitStatus::UNMATCHED;
        if node.is_live_word() {
            status |= HitStatus::MATCH;
        }
        if !node.children.is_empty() {
            status |= HitStatus::PREFIX;
        }
        let len = (begin + length).saturating_sub(hit_begin);
        if status.is_empty() {
            return Hit::unmatched(hit_begin, len);
        }
        Hit::new(
            status,
            hit_begin,
            len,
            NodeRef {
                owner: self.id,
                index: cur,
            },
        )
    }

    /// Inserts an entry, creating nodes along the way, and clears any
    /// soft-deletion on its terminal node.
    ///
    /// Returns `true` when the entry was not live before the call.
    pub fn fill<I: IntoIterator<Item = char>>(&self, chars: I) -> bool {
        let mut nodes = self.nodes.write();
        let mut cur = ROOT;
        for ch in chars {
            cur = match nodes[cur as usize].children.get(ch) {
                Some(next) => next,
                None => {
                    let idx = nodes.len() as u32;
                    nodes.push(Node::new());
                    nodes[cur as usize].children.insert(ch, idx);
                    idx
                }
            };
        }
        if cur == ROOT {
            return false;
        }
        let node = &mut nodes[cur as usize];
        let was_live = node.is_live_word();
        node.word = true;
        node.disabled.store(false, Ordering::Release);
        !was_live
    }

    /// Soft-deletes an entry. Returns `false` when its path is absent.
    pub fn disable<I: IntoIterator<Item = char>>(&self, chars: I) -> bool {
        let nodes = self.nodes.read();
        let mut cur = ROOT;
        for ch in chars {
            match nodes[cur as usize].children.get(ch) {
                Some(next) => cur = next,
                None => return false,
            }
        }
        if cur == ROOT {
            return false;
        }
        nodes[cur as usize].disabled.store(true, Ordering::Release);
        true
    }

    /// Whether `word` is a live entry.
    pub fn contains(&self, word: &str) -> bool {
        let chars: Vec<char> = word.chars().collect();
        self.match_at(&chars, 0, chars.len()).is_match()
    }

    /// Number of nodes, root included.
    pub fn node_count(&self) -> usize {
        self.nodes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.read()[ROOT as usize].children.is_empty()
    }

    /// Every live entry, in code point order.
    pub fn words(&self) -> Vec<String> {
        let nodes = self.nodes.read();
        let mut out = Vec::new();
        let mut prefix = String::new();
        collect_words(&nodes, ROOT, &mut prefix, &mut out);
        out
    }
}

fn collect_words(nodes: &[Node], idx: u32, prefix: &mut String, out: &mut Vec<String>) {
    let node = &nodes[idx as usize];
    if node.is_live_word() {
        out.push(prefix.clone());
    }
    for (ch, child) in node.children.sorted() {
        prefix.push(ch);
        collect_words(nodes, child, prefix, out);
        prefix.pop();
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    fn lexicon(words: &[&str]) -> Segment {
        let seg = Segment::new();
        for w in words {
            seg.fill(w.chars());
        }
        seg
    }

    #[test]
    fn china_fixture() {
        let seg = lexicon(&["中国", "中国人", "人"]);
        let buf = chars("中国人");

        assert_eq!(seg.match_at(&buf, 0, 2).status(), HitStatus::MATCH_PREFIX);
        assert_eq!(seg.match_at(&buf, 0, 3).status(), HitStatus::MATCH_EXACT);
        assert_eq!(seg.match_at(&buf, 0, 1).status(), HitStatus::PREFIX_ONLY);
        assert_eq!(seg.match_at(&buf, 2, 1).status(), HitStatus::MATCH_EXACT);
        // "国" alone was never inserted.
        assert_eq!(seg.match_at(&buf, 1, 1).status(), HitStatus::UNMATCHED);
    }

    #[test]
    fn disable_keeps_longer_entries() {
        let seg = lexicon(&["中国", "中国人", "人"]);
        let buf = chars("中国人");

        assert!(seg.disable("中国".chars()));
        assert_eq!(seg.match_at(&buf, 0, 2).status(), HitStatus::PREFIX_ONLY);
        assert_eq!(seg.match_at(&buf, 0, 3).status(), HitStatus::MATCH_EXACT);

        assert!(seg.fill("中国".chars()));
        assert_eq!(seg.match_at(&buf, 0, 2).status(), HitStatus::MATCH_PREFIX);
    }

    #[test]
    fn disable_leaf_is_unmatched() {
        let seg = lexicon(&["中国人"]);
        seg.disable("中国人".chars());
        assert_eq!(seg.match_at(&chars("中国人"), 0, 3).status(), HitStatus::UNMATCHED);
        assert!(seg.words().is_empty());
    }

    #[test]
    fn disable_absent_path_is_noop() {
        let seg = lexicon(&["中国"]);
        assert!(!seg.disable("美国".chars()));
        assert!(!seg.disable("中国人".chars()));
        assert!(!seg.disable("".chars()));
        assert!(seg.contains("中国"));
    }

    #[test]
    fn fill_is_idempotent() {
        let seg = lexicon(&["中国", "中国人"]);
        let nodes = seg.node_count();
        assert!(!seg.fill("中国".chars()));
        assert!(!seg.fill("中国人".chars()));
        assert_eq!(seg.node_count(), nodes);
        assert_eq!(seg.words(), vec!["中国".to_string(), "中国人".to_string()]);
    }

    #[test]
    fn empty_entry_is_ignored() {
        let seg = Segment::new();
        assert!(!seg.fill("".chars()));
        assert!(seg.is_empty());
        assert_eq!(seg.node_count(), 1);
    }

    #[test]
    fn degenerate_windows() {
        let seg = lexicon(&["人"]);
        let buf = chars("人");
        assert!(seg.match_at(&buf, 0, 0).is_unmatched());
        assert!(seg.match_at(&buf, 1, 1).is_unmatched());
        assert!(seg.match_at(&buf, usize::MAX, 2).is_unmatched());
        assert!(Segment::new().match_at(&buf, 0, 1).is_unmatched());
    }

    #[test]
    fn every_prefix_reports_prefix() {
        let words = ["中华人民共和国", "中华", "北京大学"];
        let seg = lexicon(&words);
        for w in words {
            let buf = chars(w);
            assert!(seg.match_at(&buf, 0, buf.len()).is_match(), "{}", w);
            for k in 1..buf.len() {
                assert!(seg.match_at(&buf, 0, k).is_prefix(), "{} [..{}]", w, k);
            }
        }
    }

    #[test]
    fn resume_matches_single_walk() {
        let seg = lexicon(&["中华", "中华人民共和国"]);
        let buf = chars("中华人民共和国");
        let n = buf.len();

        let mut hit = seg.match_at(&buf, 0, 1);
        assert_eq!(hit.status(), HitStatus::PREFIX_ONLY);
        for i in 1..n {
            assert!(hit.is_prefix());
            hit = seg.match_from(&buf, i, 1, &hit);
            if i == 1 {
                assert_eq!(hit.status(), HitStatus::MATCH_PREFIX);
            }
        }
        let direct = seg.match_at(&buf, 0, n);
        assert_eq!(hit.status(), direct.status());
        assert_eq!(hit.status(), HitStatus::MATCH_EXACT);
        assert_eq!((hit.begin(), hit.len()), (0, n));
    }

    #[test]
    fn resume_dead_end() {
        let seg = lexicon(&["中国人"]);
        let buf = chars("中国队");
        let hit = seg.match_at(&buf, 0, 2);
        let next = seg.match_from(&buf, 2, 1, &hit);
        assert!(next.is_unmatched());
        assert_eq!(next.begin(), 0);

        // An exact match has nothing to resume from.
        let exact = seg.match_at(&chars("中国人"), 0, 3);
        assert!(seg.match_from(&chars("中国人们"), 3, 1, &exact).is_unmatched());
    }

    #[test]
    fn resume_rejects_foreign_segment() {
        let a = lexicon(&["中国人"]);
        let b = lexicon(&["中国人"]);
        let buf = chars("中国人");
        let hit = a.match_at(&buf, 0, 1);
        assert!(b.match_from(&buf, 1, 1, &hit).is_unmatched());
        assert!(a.match_from(&buf, 1, 1, &hit).is_prefix());
    }

    #[test]
    fn children_spill_into_map() {
        let words = ["一", "丁", "七", "万", "丈", "三"];
        let seg = Segment::new();
        for w in words {
            seg.fill(format!("x{w}").chars());
        }
        for w in words {
            assert!(seg.contains(&format!("x{w}")));
        }
        assert!(!seg.contains("x上"));
        assert_eq!(seg.words().len(), words.len());
    }

    #[test]
    fn readers_survive_concurrent_inserts() {
        let seg = lexicon(&["中国", "中国人"]);
        let done = AtomicBool::new(false);
        let fixed = chars("中国人");
        let sample = chars("词条");

        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    while !done.load(Ordering::Relaxed) {
                        assert_eq!(seg.match_at(&fixed, 0, 2).status(), HitStatus::MATCH_PREFIX);
                        assert_eq!(seg.match_at(&fixed, 0, 3).status(), HitStatus::MATCH_EXACT);
                        // Either before the first insert or after it, never in between.
                        let status = seg.match_at(&sample, 0, 2).status();
                        assert!(status == HitStatus::UNMATCHED || status == HitStatus::PREFIX_ONLY);
                    }
                });
            }
            s.spawn(|| {
                for i in 0..2000u32 {
                    seg.fill(format!("词条{}", i).chars());
                }
                done.store(true, Ordering::Relaxed);
            });
        });

        assert!(seg.contains("词条1999"));
        assert!(seg.contains("中国人"));
    }
}
