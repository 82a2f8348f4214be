// src/waveform/decimation.rs

use log::{debug, warn};

/// Decimated min/max envelope of an unbounded, growing sample stream.
///
/// Every `decimation_factor` raw samples collapse into one block. Each block is
/// centred on its own mean before min/max are taken, so a block with a DC
/// offset still draws symmetric around its local baseline.
#[derive(Clone, Debug)]
pub struct DecimationBuffer {
    mins: Vec<f32>,
    maxs: Vec<f32>,
    decimation_factor: usize,
    source_sample_rate: f64,
    target_sample_rate: f64,
}

impl DecimationBuffer {
    pub fn new(source_sample_rate: f64, target_sample_rate: f64) -> Self {
        let mut buf = Self {
            mins: Vec::new(),
            maxs: Vec::new(),
            decimation_factor: 1,
            source_sample_rate: 0.0,
            target_sample_rate: if target_sample_rate.is_finite() && target_sample_rate > 0.0 {
                target_sample_rate
            } else {
                5000.0
            },
        };
        buf.set_source_sample_rate(source_sample_rate);
        buf
    }

    /// Fold a chunk of raw samples into blocks.
    ///
    /// Grouping restarts at the beginning of every chunk; a trailing short
    /// group still becomes a block.
    pub fn append(&mut self, samples: &[f32]) {
        if samples.is_empty() {
            return;
        }
        let factor = self.decimation_factor;
        self.mins.reserve(samples.len().div_ceil(factor));
        self.maxs.reserve(samples.len().div_ceil(factor));

        for group in samples.chunks(factor) {
            let mean = group.iter().map(|&s| s as f64).sum::<f64>() / group.len() as f64;
            let mut cur_min = f32::INFINITY;
            let mut cur_max = f32::NEG_INFINITY;
            for &s in group {
                let c = (s as f64 - mean) as f32;
                if c < cur_min {
                    cur_min = c;
                }
                if c > cur_max {
                    cur_max = c;
                }
            }
            if cur_min > cur_max || !cur_min.is_finite() || !cur_max.is_finite() {
                self.mins.push(0.0);
                self.maxs.push(0.0);
            } else {
                self.mins.push(cur_min);
                self.maxs.push(cur_max);
            }
        }
    }

    /// Set the capture rate for the next recording. Non-positive rates are ignored.
    ///
    /// Blocks already stored keep their old grouping.
    pub fn set_source_sample_rate(&mut self, rate: f64) {
        if !(rate.is_finite() && rate > 0.0) {
            warn!("ignoring source sample rate {rate}");
            return;
        }
        self.source_sample_rate = rate;
        self.decimation_factor = factor_for(rate, self.target_sample_rate);
        debug!(
            "decimation: source {} Hz, target {} Hz, factor {}",
            rate, self.target_sample_rate, self.decimation_factor
        );
    }

    pub fn set_target_sample_rate(&mut self, rate: f64) {
        if !(rate.is_finite() && rate > 0.0) {
            warn!("ignoring target decimation rate {rate}");
            return;
        }
        self.target_sample_rate = rate;
        if self.source_sample_rate > 0.0 {
            self.decimation_factor = factor_for(self.source_sample_rate, rate);
        }
    }

    /// Drop all blocks; the decimation factor is kept.
    pub fn reset(&mut self) {
        self.mins.clear();
        self.maxs.clear();
    }

    pub fn len(&self) -> usize {
        self.mins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mins.is_empty()
    }

    pub fn mins(&self) -> &[f32] {
        &self.mins
    }

    pub fn maxs(&self) -> &[f32] {
        &self.maxs
    }

    pub fn block(&self, index: usize) -> Option<(f32, f32)> {
        Some((*self.mins.get(index)?, *self.maxs.get(index)?))
    }

    /// Min of mins and max of maxes over `start..end` (clamped to the stored range).
    pub fn range_extremes(&self, start: usize, end: usize) -> Option<(f32, f32)> {
        let end = end.min(self.len());
        if start >= end {
            return None;
        }
        let lo = self.mins[start..end].iter().copied().fold(f32::INFINITY, f32::min);
        let hi = self.maxs[start..end].iter().copied().fold(f32::NEG_INFINITY, f32::max);
        Some((lo, hi))
    }

    pub fn decimation_factor(&self) -> usize {
        self.decimation_factor
    }

    pub fn source_sample_rate(&self) -> f64 {
        self.source_sample_rate
    }

    pub fn target_sample_rate(&self) -> f64 {
        self.target_sample_rate
    }

    /// Blocks per second. Zero until a source rate is known.
    pub fn effective_rate(&self) -> f64 {
        if self.source_sample_rate > 0.0 {
            self.source_sample_rate / self.decimation_factor as f64
        } else {
            0.0
        }
    }

    /// Block count expressed in seconds.
    pub fn duration_secs(&self) -> f64 {
        let rate = self.effective_rate();
        if rate > 0.0 { self.len() as f64 / rate } else { 0.0 }
    }
}

fn factor_for(source: f64, target: f64) -> usize {
    let ratio = (source / target).round();
    if ratio.is_finite() && ratio >= 1.0 { ratio as usize } else { 1 }
}
