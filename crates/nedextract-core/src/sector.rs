use thiserror::Error;

use crate::text::count_mentions;

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("Classifier model unavailable: {0}")]
    ModelUnavailable(String),
    #[error("Prediction failed: {0}")]
    PredictionFailed(String),
}

pub type ClassifierResult<T> = Result<T, ClassifierError>;

/// Opaque text classifier returning an activity-sector label.
#[async_trait::async_trait]
pub trait SectorClassifier: Send + Sync {
    fn classifier_id(&self) -> &str;

    async fn predict(&self, text: &str) -> ClassifierResult<String>;
}

/// Run the classifier over a document; a blank label means no sector.
pub async fn classify_sector(
    classifier: &dyn SectorClassifier,
    text: &str,
) -> ClassifierResult<Option<String>> {
    let label = classifier.predict(text).await?;
    let label = label.trim();
    if label.is_empty() {
        tracing::debug!(classifier = classifier.classifier_id(), "Classifier returned no sector");
        return Ok(None);
    }
    Ok(Some(label.to_string()))
}

/// Picks the sector whose keywords occur most often in the text. Ties go to
/// the sector registered first.
pub struct KeywordSectorClassifier {
    sectors: Vec<(String, Vec<String>)>,
}

impl KeywordSectorClassifier {
    #[must_use]
    pub fn new() -> Self {
        Self {
            sectors: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_sector(mut self, label: &str, keywords: &[&str]) -> Self {
        self.sectors.push((
            label.to_string(),
            keywords.iter().map(|k| (*k).to_string()).collect(),
        ));
        self
    }
}

impl Default for KeywordSectorClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl SectorClassifier for KeywordSectorClassifier {
    fn classifier_id(&self) -> &str {
        "keyword"
    }

    async fn predict(&self, text: &str) -> ClassifierResult<String> {
        let mut best: Option<(&str, usize)> = None;
        for (label, keywords) in &self.sectors {
            let hits: usize = keywords.iter().map(|k| count_mentions(text, k)).sum();
            if hits > 0 && best.is_none_or(|(_, n)| hits > n) {
                best = Some((label.as_str(), hits));
            }
        }
        Ok(best.map(|(label, _)| label.to_string()).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedClassifier(&'static str);

    #[async_trait::async_trait]
    impl SectorClassifier for FixedClassifier {
        fn classifier_id(&self) -> &str {
            "fixed"
        }

        async fn predict(&self, _text: &str) -> ClassifierResult<String> {
            Ok(self.0.to_string())
        }
    }

    #[tokio::test]
    async fn test_blank_label_is_no_sector() {
        assert_eq!(classify_sector(&FixedClassifier("  "), "tekst").await.unwrap(), None);
        assert_eq!(
            classify_sector(&FixedClassifier("Cultuur"), "tekst").await.unwrap(),
            Some("Cultuur".to_string())
        );
    }

    #[tokio::test]
    async fn test_keyword_classifier() {
        let classifier = KeywordSectorClassifier::new()
            .with_sector("Natuur en milieu", &["natuur", "milieu"])
            .with_sector("Gezondheid", &["ziekenhuis", "zorg"]);

        let label = classifier
            .predict("De zorg voor natuur en milieu. Natuur blijft belangrijk.")
            .await
            .unwrap();
        assert_eq!(label, "Natuur en milieu");
        assert_eq!(classifier.predict("Geen trefwoorden.").await.unwrap(), "");
    }
}
