//! Shared pieces of the simtemp command-line tools
//!
//! - [`decode`]: turns a raw record file into the sample table
//! - [`monitor`]: applies settings to a device and records what it reads

pub mod decode {
    //! Offline record decoder

    use std::io::{Read, Write};

    use anyhow::{Context, Result};
    use simtemp_core::{record::RecordReader, Sample};

    /// Column header and rule printed before the rows
    pub fn table_header() -> String {
        format!(
            "=== Temperature Samples ===\n{:<4} {:<15} {:<12} {:<8} {}\n{}\n",
            "#",
            "Timestamp(ns)",
            "Temp(°C)",
            "Temp(mC)",
            "Flags",
            "-".repeat(49)
        )
    }

    /// One table row, numbered from 1
    pub fn format_row(index: usize, sample: &Sample) -> String {
        let mut row = format!(
            "{:<4} {:<15} {:<10.2}°C {:<8} {}",
            index,
            sample.timestamp_ns,
            sample.celsius(),
            sample.temperature_mc,
            sample.flags
        );
        for name in sample.flags.names() {
            row.push(' ');
            row.push_str(name);
        }
        row
    }

    /// What a decode run saw
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct DecodeSummary {
        /// Whole records printed
        pub records: usize,
        /// Bytes after the last whole record
        pub trailing_bytes: usize,
    }

    /// Decode every record from `input` and print the table to `out`
    pub fn decode_to<R: Read, W: Write>(input: R, out: &mut W) -> Result<DecodeSummary> {
        out.write_all(table_header().as_bytes())?;

        let mut reader = RecordReader::new(input);
        for (i, sample) in reader.by_ref().enumerate() {
            let sample = sample.context("reading record")?;
            writeln!(out, "{}", format_row(i + 1, &sample))?;
        }

        Ok(DecodeSummary {
            records: reader.records_read(),
            trailing_bytes: reader.trailing_bytes(),
        })
    }
}

pub mod monitor {
    //! Live device monitor

    use std::fs::{File, OpenOptions};
    use std::io::{BufWriter, Write};
    use std::path::Path;

    use anyhow::{Context, Result};
    use log::{debug, info};
    use simtemp_core::{record, Sample};
    use simtemp_device::{Attribute, Attributes};

    /// Settings given on the command line, applied in this order
    #[derive(Debug, Clone, Default, PartialEq, Eq)]
    pub struct Settings {
        pub sampling_ms: Option<u32>,
        pub threshold_mc: Option<i32>,
        pub mode: Option<String>,
    }

    /// Push `settings` through the attribute surface
    ///
    /// Stops at the first rejected value; earlier ones stay applied.
    pub fn apply(attrs: &Attributes<'_>, settings: &Settings) -> Result<()> {
        if let Some(ms) = settings.sampling_ms {
            attrs
                .store_attr(Attribute::SamplingMs, &format!("{ms}\n"))
                .with_context(|| format!("setting sampling_ms to {ms}"))?;
        }
        if let Some(mc) = settings.threshold_mc {
            attrs
                .store_attr(Attribute::ThresholdMc, &format!("{mc}\n"))
                .with_context(|| format!("setting threshold_mC to {mc}"))?;
        }
        if let Some(mode) = &settings.mode {
            attrs
                .store_attr(Attribute::Mode, mode)
                .with_context(|| format!("setting mode to {mode:?}"))?;
        }
        info!("monitor settings applied: {:?}", settings);
        Ok(())
    }

    /// One human-readable line per sample
    pub fn format_sample(sample: &Sample) -> String {
        let alert = if sample.is_alert() { "  ALERT" } else { "" };
        format!(
            "{:>15} ns  {:>7.2} °C  {}{}",
            sample.timestamp_ns,
            sample.celsius(),
            sample.flags,
            alert
        )
    }

    /// Appends raw records to a file
    pub struct RecordSink {
        writer: BufWriter<File>,
        written: usize,
    }

    impl RecordSink {
        /// Open `path` for appending, creating it if needed
        pub fn append<P: AsRef<Path>>(path: P) -> Result<Self> {
            let path = path.as_ref();
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("opening {}", path.display()))?;
            debug!("appending records to {}", path.display());
            Ok(Self {
                writer: BufWriter::new(file),
                written: 0,
            })
        }

        /// Append one record
        pub fn write(&mut self, sample: &Sample) -> Result<()> {
            self.writer.write_all(&record::encode(sample))?;
            self.written += 1;
            Ok(())
        }

        /// Records appended so far
        pub fn written(&self) -> usize {
            self.written
        }

        /// Flush buffered records to disk
        pub fn flush(&mut self) -> Result<()> {
            self.writer.flush()?;
            Ok(())
        }
    }
}
