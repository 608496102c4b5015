use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use crate::error::{Result, TalkSenseError};

/// Counts of (true label, predicted label) pairs over a sorted label set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfusionMatrix {
    labels: Vec<String>,
    /// `counts[t][p]`: rows are true labels, columns predicted labels.
    counts: Vec<Vec<usize>>,
}

impl ConfusionMatrix {
    pub fn compute(y_true: &[String], y_pred: &[String]) -> Result<Self> {
        if y_true.len() != y_pred.len() {
            return Err(TalkSenseError::LengthMismatch {
                what: "true vs predicted labels",
                left: y_true.len(),
                right: y_pred.len(),
            });
        }

        let labels: Vec<String> = y_true
            .iter()
            .chain(y_pred)
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut counts = vec![vec![0; labels.len()]; labels.len()];
        for (t, p) in y_true.iter().zip(y_pred) {
            let (Ok(row), Ok(col)) = (labels.binary_search(t), labels.binary_search(p)) else {
                continue;
            };
            counts[row][col] += 1;
        }

        Ok(Self { labels, counts })
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn count(&self, actual: usize, predicted: usize) -> usize {
        self.counts[actual][predicted]
    }

    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    fn correct(&self) -> usize {
        (0..self.labels.len()).map(|i| self.counts[i][i]).sum()
    }

    fn support(&self, label: usize) -> usize {
        self.counts[label].iter().sum()
    }

    fn predicted(&self, label: usize) -> usize {
        self.counts.iter().map(|row| row[label]).sum()
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cell = self
            .labels
            .iter()
            .map(String::len)
            .chain(self.counts.iter().flatten().map(|c| c.to_string().len()))
            .max()
            .unwrap_or(1);

        write!(f, "{:>cell$}", "")?;
        for label in &self.labels {
            write!(f, " {label:>cell$}")?;
        }
        writeln!(f)?;
        for (label, row) in self.labels.iter().zip(&self.counts) {
            write!(f, "{label:>cell$}")?;
            for count in row {
                write!(f, " {count:>cell$}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassMetrics {
    pub label: String,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AverageMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

/// Per-class precision, recall and F1 plus accuracy and the two averages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationReport {
    pub classes: Vec<ClassMetrics>,
    pub accuracy: f64,
    pub macro_avg: AverageMetrics,
    pub weighted_avg: AverageMetrics,
    pub total_support: usize,
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

impl ClassificationReport {
    pub fn compute(y_true: &[String], y_pred: &[String]) -> Result<Self> {
        Ok(Self::from_confusion(&ConfusionMatrix::compute(y_true, y_pred)?))
    }

    /// Zero denominators yield 0 for the affected metric.
    pub fn from_confusion(matrix: &ConfusionMatrix) -> Self {
        let classes: Vec<ClassMetrics> = matrix
            .labels()
            .iter()
            .enumerate()
            .map(|(idx, label)| {
                let tp = matrix.count(idx, idx);
                let precision = ratio(tp, matrix.predicted(idx));
                let recall = ratio(tp, matrix.support(idx));
                let f1 = if precision + recall > 0.0 {
                    2.0 * precision * recall / (precision + recall)
                } else {
                    0.0
                };
                ClassMetrics {
                    label: label.clone(),
                    precision,
                    recall,
                    f1,
                    support: matrix.support(idx),
                }
            })
            .collect();

        let total_support = matrix.total();
        let n_classes = classes.len().max(1) as f64;
        let macro_avg = AverageMetrics {
            precision: classes.iter().map(|c| c.precision).sum::<f64>() / n_classes,
            recall: classes.iter().map(|c| c.recall).sum::<f64>() / n_classes,
            f1: classes.iter().map(|c| c.f1).sum::<f64>() / n_classes,
        };

        let weight = |value: fn(&ClassMetrics) -> f64| {
            if total_support == 0 {
                return 0.0;
            }
            classes
                .iter()
                .map(|c| value(c) * c.support as f64)
                .sum::<f64>()
                / total_support as f64
        };
        let weighted_avg = AverageMetrics {
            precision: weight(|c| c.precision),
            recall: weight(|c| c.recall),
            f1: weight(|c| c.f1),
        };

        Self {
            accuracy: ratio(matrix.correct(), total_support),
            classes,
            macro_avg,
            weighted_avg,
            total_support,
        }
    }
}

fn write_row(
    f: &mut fmt::Formatter<'_>,
    width: usize,
    name: &str,
    metrics: AverageMetrics,
    support: usize,
) -> fmt::Result {
    writeln!(
        f,
        "{name:>width$}  {:>9.2} {:>9.2} {:>9.2} {support:>9}",
        metrics.precision, metrics.recall, metrics.f1
    )
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .classes
            .iter()
            .map(|c| c.label.chars().count())
            .chain(std::iter::once("weighted avg".len()))
            .max()
            .unwrap_or(0);

        writeln!(
            f,
            "{:>width$}  {:>9} {:>9} {:>9} {:>9}\n",
            "", "precision", "recall", "f1-score", "support"
        )?;

        for class in &self.classes {
            let metrics = AverageMetrics {
                precision: class.precision,
                recall: class.recall,
                f1: class.f1,
            };
            write_row(f, width, &class.label, metrics, class.support)?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>width$}  {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy", "", "", self.accuracy, self.total_support
        )?;
        write_row(f, width, "macro avg", self.macro_avg, self.total_support)?;
        write_row(f, width, "weighted avg", self.weighted_avg, self.total_support)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn sample() -> ClassificationReport {
        ClassificationReport::compute(
            &labels(&["a", "a", "b", "b", "b"]),
            &labels(&["a", "b", "b", "b", "a"]),
        )
        .unwrap()
    }

    #[test]
    fn hand_computed_metrics() {
        let report = sample();
        assert!((report.accuracy - 0.6).abs() < 1e-12);
        assert!((report.classes[0].precision - 0.5).abs() < 1e-12);
        assert!((report.classes[1].recall - 2.0 / 3.0).abs() < 1e-12);
        assert!((report.macro_avg.f1 - (0.5 + 2.0 / 3.0) / 2.0).abs() < 1e-12);
        assert!((report.weighted_avg.precision - 0.6).abs() < 1e-12);
        assert_eq!(report.total_support, 5);
    }

    #[test]
    fn renders_fixed_width_table() {
        let expected = "              precision    recall  f1-score   support\n\n\
                        \x20          a       0.50      0.50      0.50         2\n\
                        \x20          b       0.67      0.67      0.67         3\n\n\
                        \x20   accuracy                           0.60         5\n\
                        \x20  macro avg       0.58      0.58      0.58         5\n\
                        weighted avg       0.60      0.60      0.60         5\n";
        assert_eq!(sample().to_string(), expected);
    }

    #[test]
    fn never_predicted_class_scores_zero() {
        let report =
            ClassificationReport::compute(&labels(&["x", "y"]), &labels(&["x", "x"])).unwrap();
        let y = &report.classes[1];
        assert_eq!((y.precision, y.recall, y.f1, y.support), (0.0, 0.0, 0.0, 1));
    }

    #[test]
    fn labels_are_union_of_true_and_predicted() {
        let matrix =
            ConfusionMatrix::compute(&labels(&["pos", "neg"]), &labels(&["pos", "irr"])).unwrap();
        assert_eq!(matrix.labels(), ["irr", "neg", "pos"]);
        assert_eq!(matrix.count(1, 0), 1);
        assert_eq!(matrix.total(), 2);
    }

    #[test]
    fn length_mismatch_is_an_error() {
        assert!(ConfusionMatrix::compute(&labels(&["a"]), &[]).is_err());
    }
}
