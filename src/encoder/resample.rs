// src/encoder/resample.rs

use rubato::{
    calculate_cutoff, Resampler, SincFixedIn, SincInterpolationParameters,
    SincInterpolationType, WindowFunction,
};

use crate::error::EncodeError;

/// Linear-interpolation resample of one channel.
///
/// The output has `round(len * new_rate / old_rate)` samples. Its first and
/// last samples are copied from the input; everything in between is
/// interpolated between the two nearest source samples.
pub fn interpolate_array(data: &[f32], new_rate: f64, old_rate: f64) -> Result<Vec<f32>, EncodeError> {
    if !(new_rate.is_finite() && new_rate > 0.0) {
        return Err(EncodeError::InvalidSampleRate(new_rate));
    }
    if !(old_rate.is_finite() && old_rate > 0.0) {
        return Err(EncodeError::InvalidSampleRate(old_rate));
    }
    if data.is_empty() || new_rate == old_rate {
        return Ok(data.to_vec());
    }

    let out_len = (data.len() as f64 * new_rate / old_rate).round() as usize;
    match out_len {
        0 => return Ok(Vec::new()),
        1 => return Ok(vec![data[0]]),
        _ => {}
    }
    if data.len() == 1 {
        return Ok(vec![data[0]; out_len]);
    }

    let spring = (data.len() - 1) as f64 / (out_len - 1) as f64;
    let mut out = Vec::with_capacity(out_len);
    out.push(data[0]);
    for i in 1..out_len - 1 {
        let tmp = i as f64 * spring;
        let before = tmp.floor() as usize;
        let after = (tmp.ceil() as usize).min(data.len() - 1);
        let frac = tmp - before as f64;
        let a = data[before] as f64;
        let b = data[after] as f64;
        out.push((a + (b - a) * frac) as f32);
    }
    out.push(data[data.len() - 1]);
    Ok(out)
}

pub fn build_resampler(
    src_rate: u32,
    dst_rate: u32,
    channels: usize,
) -> Result<Option<SincFixedIn<f32>>, EncodeError> {
    if src_rate == 0 {
        return Err(EncodeError::InvalidSampleRate(src_rate as f64));
    }
    if dst_rate == 0 {
        return Err(EncodeError::InvalidSampleRate(dst_rate as f64));
    }
    if src_rate == dst_rate {
        return Ok(None);
    }
    let ratio = dst_rate as f64 / src_rate as f64;
    let sinc_len = 256usize;
    let window = WindowFunction::BlackmanHarris2;
    let f_cutoff = calculate_cutoff(sinc_len, window);
    let params = SincInterpolationParameters {
        sinc_len,
        f_cutoff,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 128,
        window,
    };
    let chunk_size = 1024;
    let r = SincFixedIn::<f32>::new(ratio, 2.0, params, chunk_size, channels)
        .map_err(|e| EncodeError::Resampler(e.to_string()))?;
    Ok(Some(r))
}

/// Band-limited resample of a whole planar buffer. The output is trimmed of
/// the filter delay and has `round(frames * dst / src)` frames per channel.
pub fn resample_sinc(
    planar: &[Vec<f32>],
    src_rate: u32,
    dst_rate: u32,
) -> Result<Vec<Vec<f32>>, EncodeError> {
    let Some(mut resampler) = build_resampler(src_rate, dst_rate, planar.len())? else {
        return Ok(planar.to_vec());
    };
    let frames = planar_len(planar);
    let expected = (frames as f64 * dst_rate as f64 / src_rate as f64).round() as usize;
    let delay = resampler.output_delay();

    let mut stage: Vec<Vec<f32>> = planar.iter().map(|ch| ch[..frames].to_vec()).collect();
    let mut out: Vec<Vec<f32>> = vec![Vec::with_capacity(expected + delay); planar.len()];
    let push = |out: &mut Vec<Vec<f32>>, block: Vec<Vec<f32>>| {
        for (dst, src) in out.iter_mut().zip(block) {
            dst.extend_from_slice(&src);
        }
    };

    loop {
        let need = resampler.input_frames_next();
        if planar_len(&stage) < need {
            break;
        }
        let block = take_from_planar(&mut stage, need);
        let res = resampler
            .process(&block, None)
            .map_err(|e| EncodeError::Resampler(e.to_string()))?;
        push(&mut out, res);
    }
    if planar_len(&stage) > 0 {
        let res = resampler
            .process_partial(Some(stage.as_slice()), None)
            .map_err(|e| EncodeError::Resampler(e.to_string()))?;
        push(&mut out, res);
    }
    // Flush the filter tail until the delayed output is complete.
    while out.first().map(|c| c.len()).unwrap_or(0) < expected + delay {
        let res = resampler
            .process_partial::<Vec<f32>>(None, None)
            .map_err(|e| EncodeError::Resampler(e.to_string()))?;
        if res.first().map(|c| c.is_empty()).unwrap_or(true) {
            break;
        }
        push(&mut out, res);
    }

    for ch in &mut out {
        ch.drain(..delay.min(ch.len()));
        ch.truncate(expected);
    }
    Ok(out)
}

fn planar_len(planar: &[Vec<f32>]) -> usize {
    planar.iter().map(|v| v.len()).min().unwrap_or(0)
}

fn take_from_planar(planar: &mut [Vec<f32>], frames: usize) -> Vec<Vec<f32>> {
    let mut out = Vec::with_capacity(planar.len());
    for ch in planar.iter_mut() {
        let n = frames.min(ch.len());
        let tail = ch.split_off(n);
        out.push(std::mem::replace(ch, tail));
    }
    out
}
