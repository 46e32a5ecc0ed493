//! Boot diagnostics.
//!
//! Nothing in the splash path is fatal: a missing asset or a rejected calibration only
//! means the boot continues without it. Each such event becomes a [`Record`] in a small
//! [`DiagLog`] that the boot console (or the simulator) dumps afterwards. With the `defmt`
//! feature every record is also emitted through `defmt` as it happens.
//!
//! ```ignore
//! use bootsplash_common::{diag_info, diag_warn};
//!
//! diag_info!(log, "splash {}x{}", width, height);
//! diag_warn!(log, "invalid CPR value [{}]", token);
//! ```

use core::fmt;

use heapless::{Deque, String};

/// Records kept before the oldest is dropped.
pub const DIAG_CAPACITY: usize = 16;

/// Maximum bytes of text per record.
pub const DIAG_TEXT_LEN: usize = 96;

/// Record text.
pub type DiagText = String<DIAG_TEXT_LEN>;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub enum Severity {
    Debug,
    Info,
    /// Asset missing or rejected; the boot goes on
    Warn,
    Error,
}

impl Severity {
    /// One-letter console tag.
    pub const fn tag(self) -> char {
        match self {
            Self::Debug => 'D',
            Self::Info => 'I',
            Self::Warn => 'W',
            Self::Error => 'E',
        }
    }
}

#[derive(Clone, Debug)]
pub struct Record {
    pub severity: Severity,
    /// Position in the boot sequence, counting dropped records.
    pub seq: u32,
    pub text: DiagText,
}

/// Writer that keeps what fits and silently drops the rest.
struct Clipped<'a>(&'a mut DiagText);

impl fmt::Write for Clipped<'_> {
    fn write_str(
        &mut self,
        s: &str,
    ) -> fmt::Result {
        for c in s.chars() {
            if self.0.push(c).is_err() {
                break;
            }
        }
        Ok(())
    }
}

/// Bounded log of boot diagnostics, oldest first.
pub struct DiagLog {
    records: Deque<Record, DIAG_CAPACITY>,
    next_seq: u32,
}

impl DiagLog {
    pub const fn new() -> Self {
        Self {
            records: Deque::new(),
            next_seq: 0,
        }
    }

    /// Append a formatted record, dropping the oldest one when full.
    pub fn record_fmt(
        &mut self,
        severity: Severity,
        args: fmt::Arguments<'_>,
    ) {
        let mut text = DiagText::new();
        let _ = fmt::Write::write_fmt(&mut Clipped(&mut text), args);
        forward(severity, &text);

        if self.records.is_full() {
            self.records.pop_front();
        }
        let record = Record {
            severity,
            seq: self.next_seq,
            text,
        };
        let _ = self.records.push_back(record);
        self.next_seq = self.next_seq.wrapping_add(1);
    }

    /// Append a plain-text record.
    pub fn record(
        &mut self,
        severity: Severity,
        text: &str,
    ) {
        self.record_fmt(severity, format_args!("{text}"));
    }

    #[inline]
    pub fn len(&self) -> usize { self.records.len() }

    #[inline]
    pub fn is_empty(&self) -> bool { self.records.is_empty() }

    /// Most recent record.
    pub fn latest(&self) -> Option<&Record> { self.records.back() }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Record> + '_ { self.records.iter() }
}

impl Default for DiagLog {
    fn default() -> Self { Self::new() }
}

#[cfg(feature = "defmt")]
fn forward(
    severity: Severity,
    text: &str,
) {
    match severity {
        Severity::Debug => defmt::debug!("{=str}", text),
        Severity::Info => defmt::info!("{=str}", text),
        Severity::Warn => defmt::warn!("{=str}", text),
        Severity::Error => defmt::error!("{=str}", text),
    }
}

#[cfg(not(feature = "defmt"))]
#[inline]
fn forward(
    _severity: Severity,
    _text: &str,
) {
}

/// Record a formatted message at the given [`Severity`].
#[macro_export]
macro_rules! diag {
    ($log:expr, $severity:expr, $($arg:tt)*) => {
        $log.record_fmt($severity, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! diag_debug {
    ($log:expr, $($arg:tt)*) => { $crate::diag!($log, $crate::diag::Severity::Debug, $($arg)*) };
}

#[macro_export]
macro_rules! diag_info {
    ($log:expr, $($arg:tt)*) => { $crate::diag!($log, $crate::diag::Severity::Info, $($arg)*) };
}

#[macro_export]
macro_rules! diag_warn {
    ($log:expr, $($arg:tt)*) => { $crate::diag!($log, $crate::diag::Severity::Warn, $($arg)*) };
}

#[macro_export]
macro_rules! diag_error {
    ($log:expr, $($arg:tt)*) => { $crate::diag!($log, $crate::diag::Severity::Error, $($arg)*) };
}

// =============================================================================
// Tests
// =============================================================================
