use pfocus_search::{merge_overlapping, Gti};

const EPSILON: f64 = 1e-7;

fn gtis(pairs: &[(f64, f64)]) -> Vec<Gti> {
    pairs.iter().map(|&(s, e)| Gti::new(s, e)).collect()
}

#[test]
fn test_merge_reference_cases() {
    let cases: Vec<(Vec<(f64, f64)>, Vec<(f64, f64)>)> = vec![
        (vec![(1.0, 2.0)], vec![(1.0, 2.0)]),
        (vec![(1.0, 2.0), (2.0, 3.0)], vec![(1.0, 3.0)]),
        (vec![(1.0, 2.0), (3.0, 4.0)], vec![(1.0, 2.0), (3.0, 4.0)]),
        (vec![(1.0, 2.0), (2.0, 3.0), (3.0, 4.0)], vec![(1.0, 4.0)]),
        (vec![(1.0, 2.0), (2.0, 3.0), (4.0, 5.0)], vec![(1.0, 3.0), (4.0, 5.0)]),
        (vec![(1.0, 2.0), (3.0, 4.0), (4.0, 5.0)], vec![(1.0, 2.0), (3.0, 5.0)]),
        (
            vec![(1.0, 2.0), (3.0, 4.0), (5.0, 6.0)],
            vec![(1.0, 2.0), (3.0, 4.0), (5.0, 6.0)],
        ),
        (
            vec![
                (0.0, 5400.0),
                (5100.0, 10800.0),
                (10800.0, 16140.0),
                (16200.0, 21600.0),
                (21700.0, 27000.0),
            ],
            vec![(0.0, 16140.0), (16200.0, 21600.0), (21700.0, 27000.0)],
        ),
        (
            vec![
                (0.0, 5400.0),
                (5100.0, 7900.0),
                (8300.0, 10800.0),
                (10800.0, 13400.0),
                (13600.0, 16140.0),
                (16200.0, 18800.0),
                (19000.0, 21600.0),
                (21700.0, 24200.0),
                (24400.0, 27000.0),
            ],
            vec![
                (0.0, 7900.0),
                (8300.0, 13400.0),
                (13600.0, 16140.0),
                (16200.0, 18800.0),
                (19000.0, 21600.0),
                (21700.0, 24200.0),
                (24400.0, 27000.0),
            ],
        ),
    ];
    for (input, expected) in cases {
        assert_eq!(
            merge_overlapping(&gtis(&input), EPSILON),
            gtis(&expected),
            "merging {input:?}"
        );
    }
}

#[test]
fn test_merge_empty() {
    assert!(merge_overlapping(&[], EPSILON).is_empty());
}

#[test]
fn test_nested_interval_keeps_outer_end() {
    let merged = merge_overlapping(&gtis(&[(0.0, 10.0), (2.0, 5.0), (9.0, 12.0)]), EPSILON);
    assert_eq!(merged, gtis(&[(0.0, 12.0)]));
}
