/// Synthesis program text for the external DSP runtime
///
/// The program exposes two controls: `position` selects the excitation
/// channel and `value` is the strike intensity (0 means released). Each
/// mode becomes one resonant filter; the per-channel gains live in a
/// `waveform` table indexed by `channel * nModes + mode`.

use std::fmt::Write;

use super::model::ModalModel;

/// Name of the channel-select control
pub const POSITION_CONTROL: &str = "position";
/// Name of the intensity control
pub const VALUE_CONTROL: &str = "value";

const FREQ_PRECISION: usize = 4;
const T60_PRECISION: usize = 6;
const GAIN_PRECISION: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesisProgram {
    name: String,
    text: String,
    num_modes: usize,
    num_channels: usize,
}

impl SynthesisProgram {
    /// Render the program for `model`
    ///
    /// The output only depends on the model and the name.
    pub fn from_model(model: &ModalModel, name: &str) -> Self {
        let n_modes = model.num_modes();
        let n_channels = model.num_channels();
        let name = sanitize_name(name);

        let mut text = String::new();
        // Writing into a String cannot fail
        let _ = write_program(&mut text, model, &name);

        log::debug!(
            "synthesis program '{}': {} modes x {} channels, {} bytes",
            name,
            n_modes,
            n_channels,
            text.len()
        );
        Self {
            name,
            text,
            num_modes: n_modes,
            num_channels: n_channels,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }

    pub fn num_modes(&self) -> usize {
        self.num_modes
    }

    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    /// Control parameters the runtime must expose, in declaration order
    pub fn control_names(&self) -> [&'static str; 2] {
        [POSITION_CONTROL, VALUE_CONTROL]
    }
}

fn write_program(out: &mut String, model: &ModalModel, name: &str) -> std::fmt::Result {
    let n_modes = model.num_modes();
    let n_channels = model.num_channels().max(1);

    writeln!(out, "declare name \"{}\";", name)?;
    writeln!(out, "import(\"stdfaust.lib\");")?;
    writeln!(out)?;
    writeln!(out, "nModes = {};", n_modes)?;
    writeln!(out, "nChannels = {};", n_channels)?;
    writeln!(out)?;

    let freqs = join(model.modes.iter().map(|m| m.frequency_hz), FREQ_PRECISION);
    let t60s = join(model.modes.iter().map(|m| m.t60), T60_PRECISION);
    writeln!(out, "modeFreqs(n) = ba.take(n+1, ({}));", freqs)?;
    writeln!(out, "modeT60s(n) = ba.take(n+1, ({}));", t60s)?;

    // Channels without a row (no channels at all) read as silent
    let gains = if model.gains.is_empty() {
        join(std::iter::repeat(0.0).take(n_modes), GAIN_PRECISION)
    } else {
        join(model.gains.iter().flatten().copied(), GAIN_PRECISION)
    };
    writeln!(
        out,
        "modeGains(p, n) = waveform{{{}}}, int(p*nModes+n) : rdtable : select2(modeFreqs(n) < (ma.SR/2 - 1), 0);",
        gains
    )?;
    writeln!(out)?;
    writeln!(
        out,
        "modalModel(exPos) = _ <: par(i, nModes, pm.modeFilter(modeFreqs(i), modeT60s(i), modeGains(int(exPos), i))) :> /(nModes);"
    )?;
    writeln!(out)?;
    writeln!(
        out,
        "{} = nentry(\"{}\", 0, 0, nChannels-1, 1);",
        POSITION_CONTROL, POSITION_CONTROL
    )?;
    writeln!(
        out,
        "{} = hslider(\"{}\", 0, -1, 1, 0.001);",
        VALUE_CONTROL, VALUE_CONTROL
    )?;
    writeln!(out)?;
    writeln!(
        out,
        "process = ({} : ba.impulsify) * {} : modalModel({}) <: _, _;",
        VALUE_CONTROL, VALUE_CONTROL, POSITION_CONTROL
    )
}

fn join(values: impl Iterator<Item = f64>, precision: usize) -> String {
    let parts: Vec<String> = values
        .map(|v| {
            // Avoid "-0.000000" for tiny negatives
            let v = if v.abs() < 0.5 * 10f64.powi(-(precision as i32)) { 0.0 } else { v };
            format!("{:.*}", precision, v)
        })
        .collect();
    parts.join(", ")
}

fn sanitize_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| !c.is_control() && *c != '"' && *c != '\\')
        .collect();
    let trimmed = cleaned.trim();
    if trimmed.is_empty() {
        "modal".to_string()
    } else {
        trimmed.to_string()
    }
}
