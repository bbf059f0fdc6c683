//! Fixed reference sets with known k-NN orderings and Hausdorff values.

use bann_tree::{
    bregman_hausdorff, k_search, BregmanIndex, BuildConfig, DivergenceKind, IndexCache, PointSet,
    SearchParams,
};

const DIM_DATA: [[f64; 3]; 40] = [
    [0.4296287, 0.54582694, 0.02454436],
    [0.6776321, 0.18751646, 0.13485144],
    [0.0974914, 0.46193274, 0.44057586],
    [0.63578628, 0.26316086, 0.10105286],
    [0.22945766, 0.13604054, 0.6345018],
    [0.63722053, 0.18824259, 0.17453688],
    [0.50396997, 0.31401086, 0.18201917],
    [0.49469846, 0.29576555, 0.20953599],
    [0.40426814, 0.17074074, 0.42499112],
    [0.10986894, 0.54545651, 0.34467455],
    [0.31036794, 0.22884235, 0.46078971],
    [0.23513868, 0.30733254, 0.45752877],
    [0.3248107, 0.46709761, 0.20809169],
    [0.0474218, 0.27828197, 0.67429623],
    [0.00363314, 0.74667265, 0.24969421],
    [0.282168, 0.36771445, 0.35011755],
    [0.24839865, 0.09348735, 0.658114],
    [0.16890292, 0.76215108, 0.068946],
    [0.37772481, 0.09690062, 0.52537457],
    [0.52245922, 0.04822038, 0.42932041],
    [0.56000997, 0.28056901, 0.15942103],
    [0.43237275, 0.33424503, 0.23338222],
    [0.13167681, 0.11194199, 0.7563812],
    [0.50245531, 0.29345491, 0.20408978],
    [0.04321371, 0.30805602, 0.64873027],
    [0.26807204, 0.39285044, 0.33907752],
    [0.13126271, 0.50189492, 0.36684237],
    [0.66105254, 0.16892868, 0.17001878],
    [0.06683453, 0.42714443, 0.50602103],
    [0.33279741, 0.24865218, 0.41855041],
    [0.40386816, 0.35425416, 0.24187769],
    [0.39062708, 0.1732431, 0.43612982],
    [0.68608459, 0.13843772, 0.17547768],
    [0.05874155, 0.50327138, 0.43798707],
    [0.33924437, 0.26573512, 0.39502051],
    [0.098073, 0.54351756, 0.35840944],
    [0.6761732, 0.0376295, 0.28619731],
    [0.43036298, 0.52050126, 0.04913575],
    [0.71745816, 0.23047905, 0.05206279],
    [0.32845324, 0.21766456, 0.4538822],
];

const DIM_QUERY: [[f64; 3]; 10] = [
    [0.3251311, 0.33769861, 0.33717029],
    [0.47371353, 0.01794854, 0.50833792],
    [0.47749099, 0.03905358, 0.48345542],
    [0.42256473, 0.20426618, 0.37316909],
    [0.08729165, 0.423712, 0.48899635],
    [0.20434417, 0.36045547, 0.43520036],
    [0.09446384, 0.43386852, 0.47166764],
    [0.20749814, 0.22021566, 0.5722862],
    [0.4715353, 0.16871541, 0.35974929],
    [0.50778605, 0.19006153, 0.30215242],
];

type Expected = [[usize; 3]; 10];

const KNN3: [(&str, Expected); 5] = [
    (
        "kl",
        [
            [15, 25, 34],
            [19, 18, 36],
            [19, 18, 8],
            [8, 31, 34],
            [28, 2, 33],
            [11, 15, 25],
            [2, 28, 33],
            [4, 11, 10],
            [8, 31, 39],
            [8, 7, 31],
        ],
    ),
    (
        "dkl",
        [
            [15, 25, 34],
            [19, 18, 36],
            [19, 18, 36],
            [8, 31, 29],
            [28, 2, 33],
            [11, 25, 15],
            [2, 28, 33],
            [4, 11, 10],
            [8, 31, 39],
            [8, 7, 31],
        ],
    ),
    (
        "is",
        [
            [15, 25, 34],
            [19, 36, 18],
            [19, 36, 18],
            [8, 31, 39],
            [2, 28, 35],
            [11, 25, 15],
            [2, 35, 28],
            [11, 10, 39],
            [8, 31, 39],
            [8, 31, 7],
        ],
    ),
    (
        "dis",
        [
            [15, 25, 34],
            [36, 19, 18],
            [19, 36, 18],
            [8, 31, 39],
            [2, 28, 35],
            [11, 25, 15],
            [2, 28, 35],
            [11, 4, 10],
            [8, 31, 39],
            [8, 31, 5],
        ],
    ),
    (
        "se",
        [
            [15, 25, 34],
            [19, 18, 8],
            [19, 18, 8],
            [8, 31, 34],
            [28, 2, 33],
            [11, 15, 25],
            [2, 28, 33],
            [4, 11, 10],
            [8, 31, 19],
            [7, 23, 8],
        ],
    ),
];

const HAUSDORFF: [(&str, f64); 5] = [
    ("kl", 0.03451059186103342),
    ("dkl", 0.03306561649869702),
    ("is", 0.5652548546527374),
    ("dis", 0.38024526638997314),
    ("se", 0.019922427962113392),
];

fn dim_data() -> PointSet {
    PointSet::from_rows(&DIM_DATA).unwrap()
}

fn dim_query() -> PointSet {
    PointSet::from_rows(&DIM_QUERY).unwrap()
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-8 + 1e-5 * b.abs()
}

#[test]
fn knn3_reference_orderings() {
    for (tag, expected) in KNN3 {
        let kind: DivergenceKind = tag.parse().unwrap();
        let got = k_search(dim_data(), &dim_query(), 3, 0.0, kind).unwrap();
        let want: Vec<Vec<usize>> = expected.iter().map(|row| row.to_vec()).collect();
        assert_eq!(got, want, "k_search mismatch for `{tag}`");
    }
}

#[test]
fn knn3_reference_orderings_small_leaves() {
    // Same answers regardless of how finely the tree is cut.
    let config = BuildConfig {
        leaf_size: 1,
        max_depth: 64,
    };
    let params = SearchParams::exact(3).unwrap();
    for (tag, expected) in KNN3 {
        let kind: DivergenceKind = tag.parse().unwrap();
        let index = BregmanIndex::build(dim_data(), kind, &config).unwrap();
        for (qi, q) in dim_query().iter().enumerate() {
            let hit = index.knn(q, &params).unwrap();
            assert_eq!(hit.indices(), expected[qi].to_vec(), "`{tag}` query {qi}");
        }
    }
}

#[test]
fn hausdorff_reference_values() {
    for (tag, want) in HAUSDORFF {
        let kind: DivergenceKind = tag.parse().unwrap();
        let got = bregman_hausdorff(dim_data(), &dim_query(), 0.0, kind).unwrap();
        assert!(close(got.value, want), "`{tag}`: {} vs {want}", got.value);
    }
}

#[test]
fn scalar_nearest_neighbors() {
    let data = PointSet::from_rows(&[[0.1], [0.6]]).unwrap();
    let query = PointSet::from_rows(&[[0.3]]).unwrap();
    let expected = [("kl", 1), ("dkl", 0), ("is", 1), ("dis", 1), ("se", 0)];
    for (tag, nn) in expected {
        let kind: DivergenceKind = tag.parse().unwrap();
        let got = k_search(data.clone(), &query, 1, 0.0, kind).unwrap();
        assert_eq!(got, vec![vec![nn]], "`{tag}`");
    }
}

#[test]
fn output_shape_for_every_k() {
    let data = dim_data();
    let query = dim_query();
    for k in 1..=data.len() {
        let got = k_search(data.clone(), &query, k, 0.0, DivergenceKind::KullbackLeibler).unwrap();
        assert_eq!(got.len(), query.len());
        assert!(got.iter().all(|row| row.len() == k), "k = {k}");
    }
    assert!(k_search(data.clone(), &query, data.len() + 1, 0.0, DivergenceKind::KullbackLeibler)
        .unwrap_err()
        .is_parameter());
    assert!(k_search(data, &query, 0, 0.0, DivergenceKind::KullbackLeibler)
        .unwrap_err()
        .is_parameter());
}

#[test]
fn cache_reproduces_reference_values() {
    let cache = IndexCache::new(dim_data(), BuildConfig::default()).unwrap();
    let params = SearchParams::exact(3).unwrap();
    for ((tag, expected), (_, want)) in KNN3.into_iter().zip(HAUSDORFF) {
        let kind: DivergenceKind = tag.parse().unwrap();
        let got: Vec<Vec<usize>> = cache
            .k_search(&dim_query(), &params, kind)
            .unwrap()
            .iter()
            .map(|r| r.indices())
            .collect();
        let want_knn: Vec<Vec<usize>> = expected.iter().map(|row| row.to_vec()).collect();
        assert_eq!(got, want_knn, "`{tag}`");

        let h = cache.hausdorff(&dim_query(), 0.0, kind).unwrap();
        assert!(close(h.value, want), "`{tag}`");
    }
    assert_eq!(cache.cached_kinds().len(), DivergenceKind::ALL.len());
}
