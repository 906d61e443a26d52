use crate::error::PredictError;
use crate::scaler::{norm, Scaled};
use crate::schema::{PatientRecord, Preparation};

pub const FEATURE_DIM: usize = 13;

/// 训练与推理共享的列顺序；改顺序会静默破坏预测。
pub const FEATURE_NAMES: [&str; FEATURE_DIM] = [
    "age",
    "gender",
    "height",
    "weight",
    "ap_hi",
    "ap_lo",
    "cholesterol",
    "gluc",
    "smoke",
    "alco",
    "active",
    "bmi",
    "pulse_pressure",
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector(pub [f64; FEATURE_DIM]);

impl FeatureVector {
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

/// weight / (height_m)^2, height given in cm.
#[inline]
pub fn bmi(weight_kg: f64, height_cm: f64) -> f64 {
    let h = height_cm / 100.0;
    weight_kg / (h * h)
}

#[inline]
pub fn pulse_pressure(ap_hi: f64, ap_lo: f64) -> f64 {
    ap_hi - ap_lo
}

/// Build the model input for one patient.
///
/// `Preparation::Scaled` min-max scales the continuous fields and passes the
/// ordinal/binary codes through. `Preparation::Raw` keeps every field as given.
pub fn assemble(p: &PatientRecord, prep: Preparation) -> Result<FeatureVector, PredictError> {
    validate(p)?;

    let bmi = bmi(p.weight, p.height);
    let pp = pulse_pressure(p.ap_hi, p.ap_lo);

    let v = match prep {
        Preparation::Scaled => [
            norm(p.age, Scaled::Age),
            p.gender,
            norm(p.height, Scaled::Height),
            norm(p.weight, Scaled::Weight),
            norm(p.ap_hi, Scaled::ApHi),
            norm(p.ap_lo, Scaled::ApLo),
            p.cholesterol,
            p.gluc,
            p.smoke,
            p.alco,
            p.active,
            norm(bmi, Scaled::Bmi),
            norm(pp, Scaled::PulsePressure),
        ],
        Preparation::Raw => [
            p.age,
            p.gender,
            p.height,
            p.weight,
            p.ap_hi,
            p.ap_lo,
            p.cholesterol,
            p.gluc,
            p.smoke,
            p.alco,
            p.active,
            bmi,
            pp,
        ],
    };

    Ok(FeatureVector(v))
}

fn validate(p: &PatientRecord) -> Result<(), PredictError> {
    let fields = [
        ("age", p.age),
        ("gender", p.gender),
        ("height", p.height),
        ("weight", p.weight),
        ("ap_hi", p.ap_hi),
        ("ap_lo", p.ap_lo),
        ("cholesterol", p.cholesterol),
        ("gluc", p.gluc),
        ("smoke", p.smoke),
        ("alco", p.alco),
        ("active", p.active),
    ];
    if let Some((name, _)) = fields.iter().find(|(_, v)| !v.is_finite()) {
        return Err(PredictError::InvalidInput(format!("{name} must be a finite number")));
    }
    // BMI 分母
    if p.height <= 0.0 {
        return Err(PredictError::InvalidInput("height must be > 0".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patient() -> PatientRecord {
        PatientRecord {
            age: 47.0,
            gender: 2.0,
            height: 170.0,
            weight: 70.0,
            ap_hi: 120.0,
            ap_lo: 80.0,
            cholesterol: 2.0,
            gluc: 1.0,
            smoke: 0.0,
            alco: 1.0,
            active: 1.0,
        }
    }

    #[test]
    fn derived_fields() {
        assert!((bmi(70.0, 170.0) - 24.221_453_287).abs() < 1e-6);
        assert_eq!(pulse_pressure(120.0, 80.0), 40.0);
    }

    #[test]
    fn raw_mode_keeps_inputs_and_appends_derived() {
        let p = patient();
        let fv = assemble(&p, Preparation::Raw).unwrap();
        let v = fv.as_slice();
        assert_eq!(
            &v[..11],
            &[47.0, 2.0, 170.0, 70.0, 120.0, 80.0, 2.0, 1.0, 0.0, 1.0, 1.0]
        );
        assert_eq!(v[11], bmi(70.0, 170.0));
        assert_eq!(v[12], 40.0);
    }

    #[test]
    fn scaled_mode_scales_continuous_and_passes_codes() {
        let p = patient();
        let v = assemble(&p, Preparation::Scaled).unwrap().0;
        assert_eq!(v[0], 0.5);
        assert_eq!(v[1], 2.0);
        assert_eq!(v[2], norm(170.0, Scaled::Height));
        assert_eq!(v[3], norm(70.0, Scaled::Weight));
        assert_eq!(v[4], norm(120.0, Scaled::ApHi));
        assert_eq!(v[5], norm(80.0, Scaled::ApLo));
        assert_eq!(&v[6..11], &[2.0, 1.0, 0.0, 1.0, 1.0]);
        assert_eq!(v[11], norm(bmi(70.0, 170.0), Scaled::Bmi));
        assert_eq!(v[12], (40.0 - 10.0) / 110.0);
    }

    #[test]
    fn rejects_zero_height_and_nan() {
        let mut p = patient();
        p.height = 0.0;
        assert!(matches!(
            assemble(&p, Preparation::Raw),
            Err(PredictError::InvalidInput(_))
        ));

        let mut p = patient();
        p.ap_lo = f64::NAN;
        let err = assemble(&p, Preparation::Scaled).unwrap_err();
        assert!(err.to_string().contains("ap_lo"));
    }
}
