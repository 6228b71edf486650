//! WFDB records: a text header (`<record>.hea`) naming one or more binary
//! signal files next to it.
//!
//! Only single-segment records with one sample per frame are read. Sample
//! formats 16, 212 and 80 cover the accelerometer databases on PhysioNet.

use std::fs::{self, File};
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use log::{debug, warn};
use ndarray::Array2;

use crate::error::{GaitError, Result};
use crate::types::{AccelerationTrace, AXES};

const DEFAULT_SAMPLING_RATE_HZ: f64 = 250.0;
const DEFAULT_GAIN: f64 = 200.0;

/// On-disk encoding of digital samples
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SampleFormat {
    /// 16-bit little-endian two's complement
    Fmt16,
    /// Pairs of 12-bit two's complement samples packed into 3 bytes
    Fmt212,
    /// 8-bit offset binary
    Fmt80,
}

impl SampleFormat {
    fn from_code(code: u32) -> Result<Self> {
        match code {
            16 => Ok(SampleFormat::Fmt16),
            212 => Ok(SampleFormat::Fmt212),
            80 => Ok(SampleFormat::Fmt80),
            other => Err(format_error(format!("unsupported sample format {other}"))),
        }
    }

    /// Decode up to `limit` samples. `None` marks the format's missing-sample sentinel.
    fn decode(self, bytes: &[u8], limit: usize) -> Vec<Option<i32>> {
        match self {
            SampleFormat::Fmt16 => bytes
                .chunks_exact(2)
                .take(limit)
                .map(|pair| {
                    let v = i16::from_le_bytes([pair[0], pair[1]]);
                    (v != i16::MIN).then_some(v as i32)
                })
                .collect(),
            SampleFormat::Fmt80 => bytes
                .iter()
                .take(limit)
                .map(|&b| {
                    let v = b as i32 - 128;
                    (v != -128).then_some(v)
                })
                .collect(),
            SampleFormat::Fmt212 => {
                let mut out = Vec::with_capacity(bytes.len() * 2 / 3);
                for chunk in bytes.chunks(3) {
                    if chunk.len() < 2 {
                        break;
                    }
                    out.push(sign_extend_12(
                        chunk[0] as i32 | ((chunk[1] as i32 & 0x0F) << 8),
                    ));
                    if chunk.len() == 3 {
                        out.push(sign_extend_12(
                            chunk[2] as i32 | ((chunk[1] as i32 & 0xF0) << 4),
                        ));
                    }
                }
                out.truncate(limit);
                out
            }
        }
    }
}

fn sign_extend_12(raw: i32) -> Option<i32> {
    let v = if raw >= 0x800 { raw - 0x1000 } else { raw };
    (v != -0x800).then_some(v)
}

/// One signal line of a header
#[derive(Clone, Debug, PartialEq)]
pub struct SignalInfo {
    pub file_name: String,
    pub format: SampleFormat,
    pub byte_offset: u64,
    /// ADC units per physical unit
    pub gain: f64,
    pub baseline: i32,
    pub units: Option<String>,
    pub description: String,
}

impl SignalInfo {
    fn physical(&self, digital: Option<i32>) -> f64 {
        match digital {
            Some(d) => (d as i64 - self.baseline as i64) as f64 / self.gain,
            None => f64::NAN,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Header {
    pub record_name: String,
    pub sampling_rate_hz: f64,
    /// Samples per signal, when the header states it
    pub n_samples: Option<usize>,
    pub signals: Vec<SignalInfo>,
}

fn format_error(msg: impl Into<String>) -> GaitError {
    GaitError::RecordFormat(msg.into())
}

fn parse_number<T: std::str::FromStr>(token: &str, what: &str) -> Result<T> {
    token
        .parse()
        .map_err(|_| format_error(format!("invalid {what} '{token}'")))
}

/// Parse the text of a `.hea` file
pub fn parse_header(text: &str) -> Result<Header> {
    let mut lines = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'));

    let record_line = lines
        .next()
        .ok_or_else(|| format_error("header has no record line"))?;
    let mut fields = record_line.split_whitespace();

    let record_name = fields
        .next()
        .ok_or_else(|| format_error("header has no record name"))?
        .to_string();
    if record_name.contains('/') {
        return Err(format_error(format!(
            "multi-segment record '{record_name}' is not supported"
        )));
    }

    let n_signals: usize = match fields.next() {
        Some(token) => parse_number(token, "signal count")?,
        None => return Err(format_error("record line has no signal count")),
    };
    let sampling_rate_hz = match fields.next() {
        Some(token) => parse_sampling_rate(token)?,
        None => DEFAULT_SAMPLING_RATE_HZ,
    };
    let n_samples = fields
        .next()
        .map(|token| parse_number::<usize>(token, "sample count"))
        .transpose()?;

    let signals = (0..n_signals)
        .map(|i| {
            let line = lines.next().ok_or_else(|| {
                format_error(format!(
                    "header declares {n_signals} signals but describes only {i}"
                ))
            })?;
            parse_signal_line(line)
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Header {
        record_name,
        sampling_rate_hz,
        n_samples,
        signals,
    })
}

/// `fs[/counter_freq[(base_counter)]]`; zero means the default rate
fn parse_sampling_rate(token: &str) -> Result<f64> {
    let end = token.find(|c: char| c == '/' || c == '(').unwrap_or(token.len());
    let fs: f64 = parse_number(&token[..end], "sampling frequency")?;
    if fs == 0.0 {
        Ok(DEFAULT_SAMPLING_RATE_HZ)
    } else if fs.is_finite() && fs > 0.0 {
        Ok(fs)
    } else {
        Err(format_error(format!("invalid sampling frequency '{token}'")))
    }
}

fn parse_signal_line(line: &str) -> Result<SignalInfo> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 2 {
        return Err(format_error(format!("signal line '{line}' lacks a format")));
    }

    let file_name = fields[0].to_string();
    let (format, byte_offset) = parse_format_field(fields[1])?;
    let (gain, explicit_baseline, units) = match fields.get(2) {
        Some(token) => parse_gain_field(token)?,
        None => (DEFAULT_GAIN, None, None),
    };
    let adc_zero = fields
        .get(4)
        .map(|token| parse_number::<i32>(token, "ADC zero"))
        .transpose()?
        .unwrap_or(0);
    let description = fields.get(8..).map(|rest| rest.join(" ")).unwrap_or_default();

    Ok(SignalInfo {
        file_name,
        format,
        byte_offset,
        gain,
        baseline: explicit_baseline.unwrap_or(adc_zero),
        units,
        description,
    })
}

/// `format[xsamples_per_frame][:skew][+byte_offset]`
fn parse_format_field(token: &str) -> Result<(SampleFormat, u64)> {
    let digits = token
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(token.len());
    let format = SampleFormat::from_code(parse_number(&token[..digits], "sample format")?)?;

    let mut rest = &token[digits..];
    let mut byte_offset = 0;
    if let Some((head, offset)) = rest.split_once('+') {
        byte_offset = parse_number(offset, "byte offset")?;
        rest = head;
    }
    if let Some((head, skew)) = rest.split_once(':') {
        if parse_number::<i64>(skew, "skew")? != 0 {
            warn!("ignoring skew {skew} in format field '{token}'");
        }
        rest = head;
    }
    if let Some(spf) = rest.strip_prefix('x') {
        if parse_number::<usize>(spf, "samples per frame")? != 1 {
            return Err(format_error(format!(
                "multi-frequency signal '{token}' is not supported"
            )));
        }
    } else if !rest.is_empty() {
        return Err(format_error(format!("invalid format field '{token}'")));
    }

    Ok((format, byte_offset))
}

/// `gain[(baseline)][/units]`; a zero gain means the default
fn parse_gain_field(token: &str) -> Result<(f64, Option<i32>, Option<String>)> {
    let (value, units) = match token.split_once('/') {
        Some((value, units)) => (value, Some(units.to_string())),
        None => (token, None),
    };
    let (gain_str, baseline) = match value.split_once('(') {
        Some((gain, baseline)) => (
            gain,
            Some(parse_number::<i32>(baseline.trim_end_matches(')'), "baseline")?),
        ),
        None => (value, None),
    };

    let gain: f64 = parse_number(gain_str, "gain")?;
    if !gain.is_finite() {
        return Err(format_error(format!("invalid gain '{token}'")));
    }
    let gain = if gain == 0.0 { DEFAULT_GAIN } else { gain };
    Ok((gain, baseline, units))
}

/// `P` or `P.hea` -> `P.hea`
fn header_path(path: &Path) -> PathBuf {
    if path.extension().map(|e| e == "hea").unwrap_or(false) {
        path.to_path_buf()
    } else {
        let mut name = path.as_os_str().to_owned();
        name.push(".hea");
        PathBuf::from(name)
    }
}

fn read_data_file(path: &Path, byte_offset: u64) -> Result<Vec<u8>> {
    let io_err = |e: std::io::Error| GaitError::from_io(path, e);
    let file = File::open(path).map_err(io_err)?;
    let mut reader = BufReader::new(file);
    reader.seek(SeekFrom::Start(byte_offset)).map_err(io_err)?;
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes).map_err(io_err)?;
    Ok(bytes)
}

/// Load the first three signals of a WFDB record as x, y, z in physical units
pub fn read_record(path: &Path) -> Result<AccelerationTrace> {
    let header_path = header_path(path);
    let text =
        fs::read_to_string(&header_path).map_err(|e| GaitError::from_io(&header_path, e))?;
    let header = parse_header(&text)?;

    if header.signals.len() < AXES {
        return Err(format_error(format!(
            "record '{}' has {} signals, need at least {AXES}",
            header.record_name,
            header.signals.len()
        )));
    }
    if header.signals.len() > AXES {
        warn!(
            "record '{}' has {} signals; using the first {AXES} as x, y, z",
            header.record_name,
            header.signals.len()
        );
    }

    let dir = header_path.parent().unwrap_or_else(|| Path::new(""));
    let columns = read_axes(&header, dir)?;
    let n = columns[0].len();
    if columns.iter().any(|c| c.len() != n) {
        return Err(format_error(format!(
            "signal files of '{}' hold different sample counts",
            header.record_name
        )));
    }

    let mut samples = Array2::<f64>::zeros((n, AXES));
    for (axis, column) in columns.iter().enumerate() {
        let signal = &header.signals[axis];
        for (i, &digital) in column.iter().enumerate() {
            samples[[i, axis]] = signal.physical(digital);
        }
    }

    debug!(
        "loaded record '{}': {} samples at {} Hz",
        header.record_name, n, header.sampling_rate_hz
    );
    AccelerationTrace::new(samples, header.sampling_rate_hz)
}

/// Digital samples of signals 0..3, read from every file that holds one of them
fn read_axes(header: &Header, dir: &Path) -> Result<Vec<Vec<Option<i32>>>> {
    // Signals grouped by file, in header order
    let mut groups: Vec<(&str, Vec<usize>)> = Vec::new();
    for (idx, signal) in header.signals.iter().enumerate() {
        match groups.iter_mut().find(|(name, _)| *name == signal.file_name) {
            Some((_, members)) => members.push(idx),
            None => groups.push((signal.file_name.as_str(), vec![idx])),
        }
    }

    let mut columns: Vec<Vec<Option<i32>>> = vec![Vec::new(); AXES];
    for (file_name, members) in groups {
        if members.iter().all(|&idx| idx >= AXES) {
            continue;
        }
        if file_name == "~" {
            return Err(format_error("signals without a data file are not supported"));
        }

        let first = &header.signals[members[0]];
        if members.iter().any(|&idx| {
            let s = &header.signals[idx];
            s.format != first.format || s.byte_offset != first.byte_offset
        }) {
            return Err(format_error(format!(
                "signals stored in '{file_name}' disagree on format or byte offset"
            )));
        }

        let width = members.len();
        let expected = header
            .n_samples
            .map(|n| {
                n.checked_mul(width).ok_or_else(|| {
                    format_error(format!("sample count {n} of '{file_name}' is too large"))
                })
            })
            .transpose()?;
        let bytes = read_data_file(&dir.join(file_name), first.byte_offset)?;
        let digital = first.format.decode(&bytes, expected.unwrap_or(usize::MAX));

        let frames = match expected {
            Some(total) if digital.len() < total => {
                return Err(format_error(format!(
                    "'{file_name}' holds {} samples, header promises {total}",
                    digital.len()
                )));
            }
            Some(total) => total / width,
            None => digital.len() / width,
        };
        debug!("'{file_name}': {frames} frames of {width} signals");

        for (slot, &idx) in members.iter().enumerate() {
            if idx < AXES {
                columns[idx] = (0..frames).map(|f| digital[f * width + slot]).collect();
            }
        }
    }
    Ok(columns)
}
