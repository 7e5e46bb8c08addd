//! Report sink: how renderers receive a report tree

use crate::ReportError;
use schemaaudit_core::{
    CommonFile, ComparisonReport, CorruptionSection, Counts, OneOnlyGroup, OneOnlyRow,
    OneOnlySection, Side,
};

/// Receives a comparison report one section at a time
///
/// [`walk`] issues the calls in a fixed order. Lifecycle brackets default to
/// no-ops; leaf calls must be handled.
pub trait ReportSink {
    /// Report metadata, before any section
    fn start_report(&mut self, _report: &ComparisonReport) {}

    fn start_both(&mut self) {}

    /// Every common file, notable or not
    fn both(&mut self, file: &CommonFile);

    fn end_both(&mut self) {}

    fn start_one_only(&mut self, _section: &OneOnlySection) {}

    fn start_one_only_group(&mut self, _group: &OneOnlyGroup) {}

    fn one_only(&mut self, row: &OneOnlyRow);

    fn end_one_only_group(&mut self, _group: &OneOnlyGroup) {}

    fn end_one_only(&mut self, _section: &OneOnlySection) {}

    fn start_corruption(&mut self, _section: &CorruptionSection) {}

    fn corruption(&mut self, section: &CorruptionSection);

    fn end_corruption(&mut self, _section: &CorruptionSection) {}

    fn counts(&mut self, counts: &Counts);
}

/// A sink that produces a finished document
pub trait Renderer: ReportSink {
    fn finish(self) -> Result<String, ReportError>;
}

/// Drive a sink over a report
///
/// Order: common files; other-only files with their three groups; the
/// other instance's corruption; baseline-only files with their groups; the
/// baseline's corruption; counts.
pub fn walk(report: &ComparisonReport, sink: &mut dyn ReportSink) {
    sink.start_report(report);

    sink.start_both();
    for file in &report.both {
        sink.both(file);
    }
    sink.end_both();

    for side in [Side::Other, Side::Baseline] {
        let section = report.one_only(side);
        sink.start_one_only(section);
        for group in &section.groups {
            sink.start_one_only_group(group);
            for row in &group.rows {
                sink.one_only(row);
            }
            sink.end_one_only_group(group);
        }
        sink.end_one_only(section);

        let corruption = report.corruption(side);
        sink.start_corruption(corruption);
        sink.corruption(corruption);
        sink.end_corruption(corruption);
    }

    sink.counts(&report.counts);
}
