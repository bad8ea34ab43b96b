use derive_more::Display;

/// Length of the descriptors produced by the client-side face embedding model.
pub const DESCRIPTOR_LEN: usize = 128;

/// Distances strictly below this are treated as the same face.
pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum DescriptorError {
    #[display(fmt = "descriptor must have {} values, got {}", DESCRIPTOR_LEN, _0)]
    WrongLength(usize),
    #[display(fmt = "descriptor value at index {} is not a finite number", _0)]
    NotFinite(usize),
}

pub fn check_descriptor(descriptor: &[f32]) -> Result<(), DescriptorError> {
    if descriptor.len() != DESCRIPTOR_LEN {
        return Err(DescriptorError::WrongLength(descriptor.len()));
    }
    match descriptor.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(DescriptorError::NotFinite(index)),
        None => Ok(()),
    }
}

pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let diff = f64::from(*x) - f64::from(*y);
            diff * diff
        })
        .sum::<f64>()
        .sqrt()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceMatch {
    pub distance: f64,
    pub matched: bool,
}

pub fn compare(probe: &[f32], stored: &[f32], threshold: f64) -> Result<FaceMatch, DescriptorError> {
    check_descriptor(probe)?;
    check_descriptor(stored)?;

    let distance = euclidean_distance(probe, stored);
    Ok(FaceMatch {
        distance,
        matched: distance < threshold,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(fill: f32) -> Vec<f32> {
        vec![fill; DESCRIPTOR_LEN]
    }

    #[test]
    fn identical_descriptors_match() {
        let a = descriptor(0.1);
        let result = compare(&a, &a, DEFAULT_MATCH_THRESHOLD).unwrap();
        assert_eq!(result.distance, 0.0);
        assert!(result.matched);
    }

    #[test]
    fn distance_is_euclidean() {
        let mut a = descriptor(0.0);
        let mut b = descriptor(0.0);
        a[0] = 3.0;
        b[1] = 4.0;
        assert!((euclidean_distance(&a, &b) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn threshold_is_exclusive() {
        let a = descriptor(0.0);
        let mut b = descriptor(0.0);
        b[0] = 0.5;
        let at_threshold = compare(&a, &b, 0.5).unwrap();
        assert!(!at_threshold.matched);

        b[0] = 0.49;
        assert!(compare(&a, &b, 0.5).unwrap().matched);
    }

    #[test]
    fn malformed_descriptors_are_rejected() {
        let good = descriptor(0.2);
        assert_eq!(
            compare(&good[..10], &good, DEFAULT_MATCH_THRESHOLD),
            Err(DescriptorError::WrongLength(10))
        );

        let mut bad = descriptor(0.2);
        bad[7] = f32::NAN;
        assert_eq!(check_descriptor(&bad), Err(DescriptorError::NotFinite(7)));
    }

    #[test]
    fn errors_read_as_messages() {
        assert_eq!(
            DescriptorError::WrongLength(3).to_string(),
            "descriptor must have 128 values, got 3"
        );
        assert_eq!(
            DescriptorError::NotFinite(7).to_string(),
            "descriptor value at index 7 is not a finite number"
        );
    }
}
