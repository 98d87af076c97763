// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use approx::assert_abs_diff_eq;
use vec1::vec1;

use super::*;

fn domain() -> Domain {
    Domain::new(100e6, 200e6, 0.0, 3600.0).unwrap()
}

#[test]
fn test_domain_scaling() {
    let d = domain();
    let (sx, sy) = d.scale(100e6, 3600.0).unwrap();
    assert_abs_diff_eq!(sx, -1.0);
    assert_abs_diff_eq!(sy, 1.0);

    let (sx, sy) = d.scale(150e6, 1800.0).unwrap();
    assert_abs_diff_eq!(sx, 0.0);
    assert_abs_diff_eq!(sy, 0.0);

    let (sx, sy) = d.scale(175e6, 900.0).unwrap();
    assert_abs_diff_eq!(sx, 0.5);
    assert_abs_diff_eq!(sy, -0.5);
}

#[test]
fn test_degenerate_domain_fails_to_scale() {
    let d = Domain::new(150e6, 150e6, 0.0, 10.0).unwrap();
    let result = d.scale(150e6, 5.0);
    assert!(matches!(
        result,
        Err(DomainError::Degenerate {
            axis: AxisKind::Freq,
            ..
        })
    ));

    let d = Domain::new(100e6, 150e6, 10.0, 10.0).unwrap();
    assert!(matches!(
        d.scale(120e6, 10.0),
        Err(DomainError::Degenerate {
            axis: AxisKind::Time,
            ..
        })
    ));
    assert!(d.check_scalable().is_err());
}

#[test]
fn test_invalid_domain() {
    assert!(Domain::new(200e6, 100e6, 0.0, 1.0).is_err());
    assert!(Domain::new(100e6, 200e6, 1.0, 0.0).is_err());
    assert!(Domain::new(f64::NAN, 200e6, 0.0, 1.0).is_err());
}

#[test]
fn test_contains_and_overlaps() {
    let d = domain();
    assert!(d.contains(100e6, 0.0));
    assert!(d.contains(200e6, 3600.0));
    assert!(!d.contains(99e6, 10.0));
    assert!(!d.contains(150e6, 3601.0));

    let other = Domain::new(190e6, 250e6, 3000.0, 4000.0).unwrap();
    assert!(d.overlaps(&other));
    let far = Domain::new(300e6, 350e6, 0.0, 1.0).unwrap();
    assert!(!d.overlaps(&far));

    let u = d.union(&far);
    assert_abs_diff_eq!(u.start_freq(), 100e6);
    assert_abs_diff_eq!(u.end_freq(), 350e6);
    assert_abs_diff_eq!(u.end_time(), 3600.0);
}

#[test]
fn test_domain_serde() {
    let d = domain();
    let json = serde_json::to_string(&d).unwrap();
    let d2: Domain = serde_json::from_str(&json).unwrap();
    assert_eq!(d, d2);

    // Backwards axes are rejected when reading.
    let bad = r#"{"freq": [2.0, 1.0], "time": [0.0, 1.0]}"#;
    assert!(serde_json::from_str::<Domain>(bad).is_err());
}

#[test]
fn test_regular_cells() {
    let cells = Cells::regular(&domain(), 4, 2).unwrap();
    assert_eq!(cells.shape(), (4, 2));
    assert_eq!(cells.num_freq_segments(), 1);
    assert_eq!(cells.num_time_segments(), 1);
    let freqs = cells.freq_centres();
    assert_abs_diff_eq!(freqs[0], 112.5e6);
    assert_abs_diff_eq!(freqs[3], 187.5e6);
    let times = cells.time_centres();
    assert_abs_diff_eq!(times[0], 900.0);
    assert_abs_diff_eq!(times[1], 2700.0);
    assert_eq!(cells.domain(), domain());
}

#[test]
fn test_multi_segment_axis() {
    let freq = Axis::new(
        AxisKind::Freq,
        vec1![
            AxisSegment {
                start: 100.0,
                width: 10.0,
                num_cells: 2
            },
            AxisSegment {
                start: 120.0,
                width: 5.0,
                num_cells: 4
            },
        ],
    )
    .unwrap();
    assert_eq!(freq.num_segments(), 2);
    assert_eq!(freq.num_cells(), 6);
    assert_eq!(freq.centres(), vec![105.0, 115.0, 122.5, 127.5, 132.5, 137.5]);
    assert_eq!(freq.widths(), vec![10.0, 10.0, 5.0, 5.0, 5.0, 5.0]);

    let time = Axis::regular(AxisKind::Time, 0.0, 10.0, 1).unwrap();
    let cells = Cells::new(freq, time);
    assert_eq!(cells.num_freq_segments(), 2);
    assert_abs_diff_eq!(cells.domain().end_freq(), 140.0);
}

#[test]
fn test_non_contiguous_segments() {
    let result = Axis::new(
        AxisKind::Freq,
        vec1![
            AxisSegment {
                start: 100.0,
                width: 10.0,
                num_cells: 2
            },
            AxisSegment {
                start: 125.0,
                width: 5.0,
                num_cells: 4
            },
        ],
    );
    assert!(matches!(
        result,
        Err(DomainError::NonContiguousSegments { index: 1, .. })
    ));

    assert!(Axis::regular(AxisKind::Time, 0.0, 10.0, 0).is_err());
    assert!(Axis::regular(AxisKind::Time, 5.0, 5.0, 3).is_err());
}
