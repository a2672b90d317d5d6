//! Randomized check that a fragment tree, its materialized buffer and the
//! file written from it all agree.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use spark::buffer::{FileComparison, GrowableBuffer};
use spark::fragments::FragmentTree;
use std::fs;
use tempfile::TempDir;

fn random_text(rng: &mut StdRng, max_len: usize) -> String {
    let len = rng.random_range(0..=max_len);
    (0..len)
        .map(|_| {
            if rng.random_range(0..20) == 0 {
                '\n'
            } else {
                rng.random_range(b'a'..=b'z') as char
            }
        })
        .collect()
}

/// Shared material that trees borrow from.
struct Pool {
    buffers: Vec<GrowableBuffer>,
    texts: Vec<String>,
}

impl Pool {
    fn new(rng: &mut StdRng) -> Self {
        let texts: Vec<String> = (0..6).map(|_| random_text(rng, 20_000)).collect();
        let buffers = texts
            .iter()
            .map(|text| GrowableBuffer::from_text(text).unwrap())
            .collect();
        Self { buffers, texts }
    }
}

fn fill<'a>(
    tree: &mut FragmentTree<'a>,
    rng: &mut StdRng,
    pool: &'a Pool,
    shared: &'a FragmentTree<'a>,
    shared_text: &str,
    expected: &mut String,
    depth: usize,
) {
    for _ in 0..rng.random_range(1..12) {
        match rng.random_range(0..6) {
            0 | 1 => {
                let text = random_text(rng, 300);
                tree.append_owned_text(&text).unwrap();
                expected.push_str(&text);
            }
            2 => {
                let n = rng.random::<u8>();
                tree.append_formatted(format_args!("<{n}>")).unwrap();
                expected.push_str(&format!("<{n}>"));
            }
            3 => {
                let i = rng.random_range(0..pool.buffers.len());
                tree.append_borrowed_buffer(&pool.buffers[i]).unwrap();
                expected.push_str(&pool.texts[i]);
            }
            4 if depth < 3 => {
                let child = tree.append_owned_subtree().unwrap();
                fill(child, rng, pool, shared, shared_text, expected, depth + 1);
            }
            _ => {
                tree.append_borrowed_subtree(shared).unwrap();
                expected.push_str(shared_text);
            }
        }
    }
}

#[test]
fn tree_matches_materialized_and_written_file() {
    let tmp = TempDir::new().unwrap();
    for seed in 0..40u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let pool = Pool::new(&mut rng);

        let mut shared = FragmentTree::new();
        let mut shared_text = String::new();
        shared.append_owned_text("<main>").unwrap();
        shared.append_borrowed_buffer(&pool.buffers[0]).unwrap();
        shared.append_owned_text("</main>").unwrap();
        shared_text.push_str("<main>");
        shared_text.push_str(&pool.texts[0]);
        shared_text.push_str("</main>");

        let mut tree = FragmentTree::new();
        let mut expected = String::new();
        fill(&mut tree, &mut rng, &pool, &shared, &shared_text, &mut expected, 0);

        let flat = tree.materialize().unwrap();
        assert_eq!(tree.total_length(), expected.len(), "seed {seed}");
        assert!(flat.as_bytes() == expected.as_bytes(), "seed {seed}: materialized text differs");

        let path = tmp.path().join(format!("page-{seed}.html"));
        flat.write_whole_file(&path).unwrap();
        assert_eq!(tree.equals_file(&path).unwrap(), FileComparison::Same, "seed {seed}");

        if expected.is_empty() {
            continue;
        }
        let mut bytes = expected.clone().into_bytes();
        let at = rng.random_range(0..bytes.len());
        bytes[at] = if bytes[at] == b'#' { b'%' } else { b'#' };
        fs::write(&path, &bytes).unwrap();
        assert_eq!(tree.equals_file(&path).unwrap(), FileComparison::Distinct, "seed {seed}: flipped byte {at}");

        bytes = expected.clone().into_bytes();
        bytes.truncate(bytes.len() - 1);
        fs::write(&path, &bytes).unwrap();
        assert_eq!(tree.equals_file(&path).unwrap(), FileComparison::Distinct, "seed {seed}: truncated");

        bytes = expected.clone().into_bytes();
        bytes.push(b'x');
        fs::write(&path, &bytes).unwrap();
        assert_eq!(tree.equals_file(&path).unwrap(), FileComparison::Distinct, "seed {seed}: extended");
    }
}

#[test]
fn missing_file_is_not_found_error() {
    let tmp = TempDir::new().unwrap();
    let mut tree = FragmentTree::new();
    tree.append_owned_text("hello").unwrap();
    let err = tree.equals_file(&tmp.path().join("absent.html")).unwrap_err();
    assert!(err.is_not_found());
}
