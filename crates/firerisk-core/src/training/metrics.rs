//! Diagnostic classification metrics. Nothing here gates training.

use std::fmt;

use serde::Serialize;

use crate::label::FireClass;

const N: usize = FireClass::ALL.len();

/// Rows are true classes, columns predicted classes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConfusionMatrix {
    pub counts: [[usize; N]; N],
}

impl ConfusionMatrix {
    pub fn from_labels(truth: &[FireClass], predicted: &[FireClass]) -> Self {
        let mut cm = Self::default();
        for (&t, &p) in truth.iter().zip(predicted) {
            cm.counts[t.index()][p.index()] += 1;
        }
        cm
    }

    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    pub fn accuracy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let hits: usize = (0..N).map(|i| self.counts[i][i]).sum();
        hits as f64 / total as f64
    }

    fn support(&self, c: usize) -> usize {
        self.counts[c].iter().sum()
    }

    fn predicted(&self, c: usize) -> usize {
        (0..N).map(|r| self.counts[r][c]).sum()
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>8}", "true\\pred")?;
        for c in 0..N {
            write!(f, "{c:>8}")?;
        }
        writeln!(f)?;
        for (r, row) in self.counts.iter().enumerate() {
            write!(f, "{r:>9}")?;
            for v in row {
                write!(f, "{v:>8}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassReport {
    pub class: FireClass,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub confusion: ConfusionMatrix,
    pub accuracy: f64,
    pub per_class: Vec<ClassReport>,
}

#[inline]
fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

impl Evaluation {
    pub fn from_labels(truth: &[FireClass], predicted: &[FireClass]) -> Self {
        let confusion = ConfusionMatrix::from_labels(truth, predicted);
        let per_class = FireClass::ALL
            .iter()
            .map(|&class| {
                let c = class.index();
                let tp = confusion.counts[c][c];
                let precision = ratio(tp, confusion.predicted(c));
                let recall = ratio(tp, confusion.support(c));
                let f1 = if precision + recall > 0.0 {
                    2.0 * precision * recall / (precision + recall)
                } else {
                    0.0
                };
                ClassReport { class, precision, recall, f1, support: confusion.support(c) }
            })
            .collect();
        Self { accuracy: confusion.accuracy(), confusion, per_class }
    }

    pub fn macro_f1(&self) -> f64 {
        let present: Vec<&ClassReport> = self.per_class.iter().filter(|r| r.support > 0).collect();
        if present.is_empty() {
            return 0.0;
        }
        present.iter().map(|r| r.f1).sum::<f64>() / present.len() as f64
    }
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:>9} {:>9} {:>9} {:>9} {:>9}", "class", "precision", "recall", "f1", "support")?;
        for r in &self.per_class {
            writeln!(
                f,
                "{:>9} {:>9.3} {:>9.3} {:>9.3} {:>9}",
                u8::from(r.class),
                r.precision,
                r.recall,
                r.f1,
                r.support
            )?;
        }
        writeln!(f, "accuracy {:.3}  macro-f1 {:.3}", self.accuracy, self.macro_f1())
    }
}
