use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use ikdict::{Config, Dictionary, HitStatus, MemorySource};

fn chars(s: &str) -> Vec<char> {
    s.chars().collect()
}

fn dictionary() -> (Arc<Dictionary>, Arc<MemorySource>) {
    let source = Arc::new(MemorySource::with([
        ("main2012.dic", "中国\n中国人\n人\n"),
        ("ext.dic", ""),
        ("quantifier.dic", "个"),
    ]));
    let config = Config {
        ext_dictionaries: vec!["ext.dic".into()],
        ..Config::default()
    };
    let dict = Dictionary::open(config, source.clone()).unwrap();
    (dict, source)
}

#[test]
fn readers_see_consistent_snapshots_during_writes() {
    let (dict, source) = dictionary();
    let stop = Arc::new(AtomicBool::new(false));

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let dict = Arc::clone(&dict);
            let stop = Arc::clone(&stop);
            thread::spawn(move || {
                let fixed = chars("中国人");
                let sample = chars("新词九十九");
                let mut rounds = 0u64;
                while !stop.load(Ordering::Relaxed) {
                    assert_eq!(dict.match_main(&fixed, 0, 2).status(), HitStatus::MATCH_PREFIX);
                    assert_eq!(dict.match_main(&fixed, 0, 3).status(), HitStatus::MATCH_EXACT);

                    // Entries land whole: once "新" is visible, so is "新词".
                    let first = dict.match_main(&sample, 0, 1);
                    if first.is_prefix() {
                        let second = dict.resume(&sample, 1, &first);
                        assert_eq!(second.status(), HitStatus::PREFIX_ONLY);
                        assert_eq!((second.begin(), second.len()), (0, 2));
                    } else {
                        assert!(first.is_unmatched());
                    }
                    rounds += 1;
                }
                rounds
            })
        })
        .collect();

    let writer = {
        let dict = Arc::clone(&dict);
        thread::spawn(move || {
            for i in 0..3000 {
                dict.add_words([format!("新词{}", i)]);
                if i % 100 == 0 {
                    dict.disable_words(["新词0"]);
                    dict.add_words(["新词0"]);
                }
            }
        })
    };

    let reloader = {
        let dict = Arc::clone(&dict);
        let source = Arc::clone(&source);
        thread::spawn(move || {
            let mut text = String::new();
            for i in 0..50 {
                text.push_str(&format!("扩展{}\n", i));
                source.insert("ext.dic", &text);
                dict.reload();
            }
        })
    };

    writer.join().unwrap();
    reloader.join().unwrap();
    stop.store(true, Ordering::Relaxed);
    for r in readers {
        assert!(r.join().unwrap() > 0);
    }

    let main = dict.lexicon(ikdict::Lexicon::Main);
    assert!(main.contains("新词2999"));
    assert!(main.contains("新词0"));
    assert!(main.contains("扩展49"));
    assert_eq!(dict.ingested_main_count(), 3 + 50);
}

#[test]
fn parallel_batch_matching() {
    use rayon::prelude::*;

    let (dict, _source) = dictionary();
    let words: Vec<String> = (0..1000).map(|i| format!("批量{}", i)).collect();
    dict.add_words(&words);

    let matched = words
        .par_iter()
        .filter(|w| {
            let buf = chars(w);
            dict.match_main(&buf, 0, buf.len()).is_match()
        })
        .count();
    assert_eq!(matched, words.len());
}
