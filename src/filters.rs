//! Butterworth filter design and causal application.
//!
//! Filters are realised as cascades of second-order sections (plus a single
//! first-order section for odd orders). Each section comes from the bilinear
//! transform with frequency prewarping, so the cascade reproduces the
//! analogue Butterworth magnitude response exactly at the corner frequency.
//! A bandpass is a highpass at the lower corner followed by a lowpass at the
//! upper corner, both of the requested order.

use crate::errors::{FractalDimensionError, FractalResult};
use num_complex::Complex64;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Resolved passband of a filter request, corners in Hz.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FilterBand {
    /// Pass below `corner`
    Lowpass {
        /// Corner frequency (Hz)
        corner: f64,
    },
    /// Pass above `corner`
    Highpass {
        /// Corner frequency (Hz)
        corner: f64,
    },
    /// Pass between `low` and `high`
    Bandpass {
        /// Lower corner (Hz)
        low: f64,
        /// Upper corner (Hz)
        high: f64,
    },
}

impl FilterBand {
    /// Analogue Butterworth magnitude at `freq` Hz for the given order.
    ///
    /// Lowpass `1/sqrt(1 + (f/fc)^2n)`, highpass `1/sqrt(1 + (fc/f)^2n)`,
    /// bandpass the product of the two. The highpass gain at DC is zero.
    pub fn butterworth_gain(&self, freq: f64, order: usize) -> f64 {
        let f = freq.abs();
        match *self {
            FilterBand::Lowpass { corner } => lowpass_gain(f, corner, order),
            FilterBand::Highpass { corner } => highpass_gain(f, corner, order),
            FilterBand::Bandpass { low, high } => {
                highpass_gain(f, low, order) * lowpass_gain(f, high, order)
            }
        }
    }
}

fn lowpass_gain(f: f64, corner: f64, order: usize) -> f64 {
    1.0 / (1.0 + (f / corner).powi(2 * order as i32)).sqrt()
}

fn highpass_gain(f: f64, corner: f64, order: usize) -> f64 {
    if f == 0.0 {
        return 0.0;
    }
    1.0 / (1.0 + (corner / f).powi(2 * order as i32)).sqrt()
}

/// One normalized IIR section, `a[0] == 1`.
///
/// First-order sections carry zeros in `b[2]` and `a[2]`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SecondOrderSection {
    /// Numerator coefficients
    pub b: [f64; 3],
    /// Denominator coefficients
    pub a: [f64; 3],
}

impl SecondOrderSection {
    /// Filter `data` in place, Direct Form II transposed, zero initial state.
    fn process(&self, data: &mut [f64]) {
        let [b0, b1, b2] = self.b;
        let [_, a1, a2] = self.a;
        let mut z1 = 0.0;
        let mut z2 = 0.0;
        for x in data.iter_mut() {
            let input = *x;
            let output = b0 * input + z1;
            z1 = b1 * input - a1 * output + z2;
            z2 = b2 * input - a2 * output;
            *x = output;
        }
    }

    /// Complex response at `z = e^{jω}`.
    fn response(&self, omega: f64) -> Complex64 {
        let z1 = Complex64::from_polar(1.0, -omega);
        let z2 = z1 * z1;
        let num = self.b[0] + z1 * self.b[1] + z2 * self.b[2];
        let den = self.a[0] + z1 * self.a[1] + z2 * self.a[2];
        num / den
    }
}

/// Pole quality factors of an analogue Butterworth prototype.
///
/// Returns the Q of every conjugate pole pair; odd orders additionally have
/// one real pole, which the caller handles as a first-order section.
pub fn butterworth_q_factors(order: usize) -> Vec<f64> {
    (0..order / 2)
        .map(|k| {
            let angle = (2 * k + 1) as f64 * PI / (2 * order) as f64;
            1.0 / (2.0 * angle.sin())
        })
        .collect()
}

#[derive(Debug, Clone, Copy)]
enum SectionKind {
    Lowpass,
    Highpass,
}

fn biquad(kind: SectionKind, corner: f64, q: f64, sampling_rate: f64) -> SecondOrderSection {
    let w0 = 2.0 * PI * corner / sampling_rate;
    let cos_w0 = w0.cos();
    let alpha = w0.sin() / (2.0 * q);
    let a0 = 1.0 + alpha;

    let (b0, b1, b2) = match kind {
        SectionKind::Lowpass => ((1.0 - cos_w0) * 0.5, 1.0 - cos_w0, (1.0 - cos_w0) * 0.5),
        SectionKind::Highpass => ((1.0 + cos_w0) * 0.5, -(1.0 + cos_w0), (1.0 + cos_w0) * 0.5),
    };

    SecondOrderSection {
        b: [b0 / a0, b1 / a0, b2 / a0],
        a: [1.0, -2.0 * cos_w0 / a0, (1.0 - alpha) / a0],
    }
}

fn first_order(kind: SectionKind, corner: f64, sampling_rate: f64) -> SecondOrderSection {
    let k = (PI * corner / sampling_rate).tan();
    let a1 = (k - 1.0) / (k + 1.0);
    let b = match kind {
        SectionKind::Lowpass => [k / (k + 1.0), k / (k + 1.0), 0.0],
        SectionKind::Highpass => [1.0 / (k + 1.0), -1.0 / (k + 1.0), 0.0],
    };
    SecondOrderSection {
        b,
        a: [1.0, a1, 0.0],
    }
}

fn design_sections(
    kind: SectionKind,
    corner: f64,
    order: usize,
    sampling_rate: f64,
) -> Vec<SecondOrderSection> {
    let mut sections: Vec<SecondOrderSection> = butterworth_q_factors(order)
        .into_iter()
        .map(|q| biquad(kind, corner, q, sampling_rate))
        .collect();
    if order % 2 == 1 {
        sections.push(first_order(kind, corner, sampling_rate));
    }
    sections
}

/// Digital Butterworth filter as a cascade of sections.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ButterworthFilter {
    band: FilterBand,
    order: usize,
    sampling_rate: f64,
    sections: Vec<SecondOrderSection>,
}

impl ButterworthFilter {
    /// Design a filter for `band` at the given order and sampling rate.
    ///
    /// # Errors
    /// `InvalidParameter` if the order is zero, the sampling rate is not
    /// positive, or a corner is not strictly between 0 and Nyquist.
    pub fn design(band: FilterBand, order: usize, sampling_rate: f64) -> FractalResult<Self> {
        if order == 0 {
            return Err(FractalDimensionError::InvalidParameter {
                parameter: "corners".to_string(),
                value: 0.0,
                constraint: ">= 1".to_string(),
            });
        }
        if !(sampling_rate.is_finite() && sampling_rate > 0.0) {
            return Err(FractalDimensionError::InvalidParameter {
                parameter: "sampling_rate".to_string(),
                value: sampling_rate,
                constraint: "finite and > 0".to_string(),
            });
        }

        let nyquist = 0.5 * sampling_rate;
        let check = |corner: f64, name: &str| -> FractalResult<()> {
            if corner > 0.0 && corner < nyquist {
                Ok(())
            } else {
                Err(FractalDimensionError::InvalidParameter {
                    parameter: name.to_string(),
                    value: corner,
                    constraint: format!("in (0, {}) Hz", nyquist),
                })
            }
        };

        let sections = match band {
            FilterBand::Lowpass { corner } => {
                check(corner, "freq_max")?;
                design_sections(SectionKind::Lowpass, corner, order, sampling_rate)
            }
            FilterBand::Highpass { corner } => {
                check(corner, "freq_min")?;
                design_sections(SectionKind::Highpass, corner, order, sampling_rate)
            }
            FilterBand::Bandpass { low, high } => {
                check(low, "freq_min")?;
                check(high, "freq_max")?;
                if low >= high {
                    return Err(FractalDimensionError::InvalidParameter {
                        parameter: "freq_min".to_string(),
                        value: low,
                        constraint: format!("< freq_max ({})", high),
                    });
                }
                let mut sections =
                    design_sections(SectionKind::Highpass, low, order, sampling_rate);
                sections.extend(design_sections(
                    SectionKind::Lowpass,
                    high,
                    order,
                    sampling_rate,
                ));
                sections
            }
        };

        log::debug!(
            "Designed {:?} Butterworth filter, order {}, {} sections at {} Hz",
            band,
            order,
            sections.len(),
            sampling_rate
        );

        Ok(Self {
            band,
            order,
            sampling_rate,
            sections,
        })
    }

    /// Filter a signal causally; output has the input's length.
    pub fn apply(&self, data: &[f64]) -> Vec<f64> {
        let mut output = data.to_vec();
        for section in &self.sections {
            section.process(&mut output);
        }
        output
    }

    /// Magnitude of the digital response at `freq` Hz.
    pub fn magnitude_response(&self, freq: f64) -> f64 {
        let omega = 2.0 * PI * freq / self.sampling_rate;
        self.sections
            .iter()
            .fold(Complex64::new(1.0, 0.0), |acc, section| {
                acc * section.response(omega)
            })
            .norm()
    }

    /// The cascade.
    pub fn sections(&self) -> &[SecondOrderSection] {
        &self.sections
    }

    /// Passband.
    pub fn band(&self) -> FilterBand {
        self.band
    }

    /// Butterworth order per edge.
    pub fn order(&self) -> usize {
        self.order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    const FS: f64 = 100.0;

    #[test]
    fn test_q_factors() {
        let q2 = butterworth_q_factors(2);
        assert_eq!(q2.len(), 1);
        assert_approx_eq!(q2[0], std::f64::consts::FRAC_1_SQRT_2, 1e-12);

        let q3 = butterworth_q_factors(3);
        assert_eq!(q3.len(), 1);
        assert_approx_eq!(q3[0], 1.0, 1e-12);

        assert_eq!(butterworth_q_factors(4).len(), 2);
        assert!(butterworth_q_factors(1).is_empty());
    }

    #[test]
    fn test_section_counts() {
        let lp = ButterworthFilter::design(FilterBand::Lowpass { corner: 5.0 }, 4, FS).unwrap();
        assert_eq!(lp.sections().len(), 2);
        let lp = ButterworthFilter::design(FilterBand::Lowpass { corner: 5.0 }, 5, FS).unwrap();
        assert_eq!(lp.sections().len(), 3);
        let bp = ButterworthFilter::design(
            FilterBand::Bandpass {
                low: 1.0,
                high: 10.0,
            },
            4,
            FS,
        )
        .unwrap();
        assert_eq!(bp.sections().len(), 4);
    }

    #[test]
    fn test_corner_gain_is_half_power() {
        for order in 1..=6 {
            let lp =
                ButterworthFilter::design(FilterBand::Lowpass { corner: 5.0 }, order, FS).unwrap();
            assert_approx_eq!(lp.magnitude_response(5.0), std::f64::consts::FRAC_1_SQRT_2, 1e-9);
            assert_approx_eq!(lp.magnitude_response(0.0), 1.0, 1e-9);

            let hp =
                ButterworthFilter::design(FilterBand::Highpass { corner: 5.0 }, order, FS)
                    .unwrap();
            assert_approx_eq!(hp.magnitude_response(5.0), std::f64::consts::FRAC_1_SQRT_2, 1e-9);
            assert!(hp.magnitude_response(0.0) < 1e-9);
        }
    }

    #[test]
    fn test_stopband_attenuation_grows_with_order() {
        let mut previous = f64::INFINITY;
        for order in 1..=8 {
            let lp =
                ButterworthFilter::design(FilterBand::Lowpass { corner: 2.0 }, order, FS).unwrap();
            let gain = lp.magnitude_response(10.0);
            assert!(gain < previous, "order {} gain {} >= {}", order, gain, previous);
            previous = gain;
        }
    }

    #[test]
    fn test_highpass_attenuation_grows_with_order() {
        let band = FilterBand::Highpass { corner: 5.0 };
        let mut previous_digital = f64::INFINITY;
        let mut previous_analogue = f64::INFINITY;
        for order in 1..=8 {
            let hp = ButterworthFilter::design(band, order, FS).unwrap();
            let digital = hp.magnitude_response(1.0);
            let analogue = band.butterworth_gain(1.0, order);
            assert!(
                digital < previous_digital,
                "order {} gain {} >= {}",
                order,
                digital,
                previous_digital
            );
            assert!(analogue < previous_analogue);
            previous_digital = digital;
            previous_analogue = analogue;
        }
    }

    #[test]
    fn test_bandpass_attenuation_grows_with_order_on_both_sides() {
        let band = FilterBand::Bandpass {
            low: 1.0,
            high: 10.0,
        };
        for freq in [0.2, 30.0] {
            let mut previous_digital = f64::INFINITY;
            let mut previous_analogue = f64::INFINITY;
            for order in 1..=8 {
                let bp = ButterworthFilter::design(band, order, FS).unwrap();
                let digital = bp.magnitude_response(freq);
                let analogue = band.butterworth_gain(freq, order);
                assert!(
                    digital < previous_digital,
                    "{} Hz, order {}: gain {} >= {}",
                    freq,
                    order,
                    digital,
                    previous_digital
                );
                assert!(
                    analogue < previous_analogue,
                    "{} Hz, order {}: analogue gain {} >= {}",
                    freq,
                    order,
                    analogue,
                    previous_analogue
                );
                previous_digital = digital;
                previous_analogue = analogue;
            }
        }

        // Inside the band the gain stays close to one for every order
        for order in 1..=8 {
            assert!(band.butterworth_gain(3.0, order) > 0.85);
        }
    }

    #[test]
    fn test_apply_preserves_length_and_removes_dc_for_highpass() {
        let data: Vec<f64> = (0..2000)
            .map(|i| 3.0 + (2.0 * PI * 10.0 * i as f64 / FS).sin())
            .collect();
        let hp = ButterworthFilter::design(FilterBand::Highpass { corner: 1.0 }, 4, FS).unwrap();
        let filtered = hp.apply(&data);
        assert_eq!(filtered.len(), data.len());

        let tail = &filtered[1000..];
        let mean = tail.iter().sum::<f64>() / tail.len() as f64;
        assert!(mean.abs() < 0.05, "residual DC {}", mean);
    }

    #[test]
    fn test_lowpass_attenuates_high_tone() {
        let data: Vec<f64> = (0..4000)
            .map(|i| (2.0 * PI * 30.0 * i as f64 / FS).sin())
            .collect();
        let lp = ButterworthFilter::design(FilterBand::Lowpass { corner: 2.0 }, 4, FS).unwrap();
        let filtered = lp.apply(&data);
        let peak = filtered[2000..]
            .iter()
            .fold(0.0f64, |acc, &x| acc.max(x.abs()));
        assert!(peak < 1e-3, "30 Hz tone survived with amplitude {}", peak);
    }

    #[test]
    fn test_design_rejects_bad_corners() {
        assert!(ButterworthFilter::design(FilterBand::Lowpass { corner: 50.0 }, 4, FS).is_err());
        assert!(ButterworthFilter::design(FilterBand::Lowpass { corner: 0.0 }, 4, FS).is_err());
        assert!(ButterworthFilter::design(FilterBand::Lowpass { corner: 5.0 }, 0, FS).is_err());
        assert!(ButterworthFilter::design(FilterBand::Lowpass { corner: 5.0 }, 4, 0.0).is_err());
    }

    #[test]
    fn test_analogue_gain_shape() {
        let band = FilterBand::Bandpass {
            low: 1.0,
            high: 10.0,
        };
        assert_eq!(band.butterworth_gain(0.0, 4), 0.0);
        assert!(band.butterworth_gain(3.0, 4) > 0.99);
        assert!(band.butterworth_gain(40.0, 4) < 1e-3);
    }
}
