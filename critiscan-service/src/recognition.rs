//! Turning an uploaded report photograph into structured values.
//!
//! [`ReadingRecognizer`] is the seam for a real OCR or vision backend. The only
//! implementation shipped here, [`FixedValueRecognizer`], checks that the upload
//! is an image and returns the same placeholder values every time.

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};
use critiscan_core::{
    AnalysisError, BloodGasReading, ClinicalRecord, LabPanel, VentilatorSettings,
};
use image::ImageFormat;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadingKind {
    Abg,
    Ventilator,
    Labs,
}

impl ReadingKind {
    pub fn label(&self) -> &'static str {
        match self {
            ReadingKind::Abg => "ABG Results",
            ReadingKind::Ventilator => "Ventilator Settings",
            ReadingKind::Labs => "Lab Reports",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "values", rename_all = "lowercase")]
pub enum ExtractedReading {
    Abg(BloodGasReading),
    Ventilator(VentilatorSettings),
    Labs(LabPanel),
}

impl ExtractedReading {
    pub fn kind(&self) -> ReadingKind {
        match self {
            ExtractedReading::Abg(_) => ReadingKind::Abg,
            ExtractedReading::Ventilator(_) => ReadingKind::Ventilator,
            ExtractedReading::Labs(_) => ReadingKind::Labs,
        }
    }

    pub fn validate(&self) -> Result<(), AnalysisError> {
        match self {
            ExtractedReading::Abg(abg) => abg.validate(),
            ExtractedReading::Ventilator(settings) => settings.validate(),
            ExtractedReading::Labs(labs) => labs.validate(),
        }
    }

    pub fn into_record(self) -> ClinicalRecord {
        match self {
            ExtractedReading::Abg(abg) => ClinicalRecord {
                abg: Some(abg),
                ..Default::default()
            },
            ExtractedReading::Ventilator(settings) => ClinicalRecord {
                ventilator: Some(settings),
                ..Default::default()
            },
            ExtractedReading::Labs(labs) => ClinicalRecord {
                labs: Some(labs),
                ..Default::default()
            },
        }
    }
}

#[derive(Error, Debug)]
pub enum RecognitionError {
    #[error("Upload is empty")]
    EmptyUpload,

    #[error("Upload is not a recognised image format")]
    UnsupportedImage,

    #[error("Recognition backend failed: {0}")]
    Backend(String),

    #[error("Recognised values are not usable: {0}")]
    InvalidReading(#[from] AnalysisError),
}

#[async_trait]
pub trait ReadingRecognizer: Send + Sync {
    async fn recognize(
        &self,
        kind: ReadingKind,
        image: &[u8],
    ) -> Result<ExtractedReading, RecognitionError>;
}

pub fn detect_image_format(image: &[u8]) -> Result<ImageFormat, RecognitionError> {
    if image.is_empty() {
        return Err(RecognitionError::EmptyUpload);
    }
    image::guess_format(image).map_err(|_| RecognitionError::UnsupportedImage)
}

/// Decode a base64 image payload, tolerating a `data:<mime>;base64,` prefix.
pub fn decode_image_base64(payload: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let encoded = match payload.split_once(";base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => payload,
    };
    STANDARD.decode(encoded.trim())
}

/// Placeholder recognizer: ignores image content and returns fixed bedside values.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixedValueRecognizer;

impl FixedValueRecognizer {
    pub fn reading_for(kind: ReadingKind) -> ExtractedReading {
        match kind {
            ReadingKind::Abg => ExtractedReading::Abg(BloodGasReading {
                ph: 7.18,
                pa_co2: 55.0,
                pa_o2: 60.0,
                hco3: 18.0,
                anion_gap: 22.0,
                fio2: 50.0,
            }),
            ReadingKind::Ventilator => ExtractedReading::Ventilator(VentilatorSettings {
                mode: "AC/VC".to_string(),
                fio2: 60.0,
                peep: 5.0,
                tidal_volume: 400.0,
                respiratory_rate: 12.0,
            }),
            ReadingKind::Labs => ExtractedReading::Labs(LabPanel {
                potassium: 6.5,
                sodium: 138.0,
                calcium: 8.2,
                magnesium: 1.6,
                lactate: 4.5,
                hemoglobin: 6.8,
                creatinine: 1.8,
            }),
        }
    }
}

#[async_trait]
impl ReadingRecognizer for FixedValueRecognizer {
    async fn recognize(
        &self,
        kind: ReadingKind,
        image: &[u8],
    ) -> Result<ExtractedReading, RecognitionError> {
        let format = detect_image_format(image)?;
        info!(
            kind = ?kind,
            format = ?format,
            bytes = image.len(),
            "Returning placeholder values for uploaded image"
        );

        let reading = Self::reading_for(kind);
        reading.validate()?;
        Ok(reading)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::DynamicImage;
    use std::io::Cursor;

    pub(crate) fn png_bytes() -> Vec<u8> {
        let mut buffer = Vec::new();
        DynamicImage::new_rgb8(8, 8)
            .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .unwrap();
        buffer
    }

    #[tokio::test]
    async fn recognizes_each_kind_from_png() {
        let recognizer = FixedValueRecognizer;
        let image = png_bytes();
        for kind in [ReadingKind::Abg, ReadingKind::Ventilator, ReadingKind::Labs] {
            let reading = recognizer.recognize(kind, &image).await.unwrap();
            assert_eq!(reading.kind(), kind);
        }
    }

    #[tokio::test]
    async fn placeholder_abg_values() {
        let reading = FixedValueRecognizer
            .recognize(ReadingKind::Abg, &png_bytes())
            .await
            .unwrap();
        let record = reading.into_record();
        let abg = record.abg.unwrap();
        assert_eq!(abg.ph, 7.18);
        assert_eq!(abg.fio2, 50.0);
        assert!(record.labs.is_none());
    }

    #[tokio::test]
    async fn rejects_non_image_bytes() {
        let err = FixedValueRecognizer
            .recognize(ReadingKind::Labs, b"potassium 6.5")
            .await
            .unwrap_err();
        assert!(matches!(err, RecognitionError::UnsupportedImage));

        let err = FixedValueRecognizer
            .recognize(ReadingKind::Labs, &[])
            .await
            .unwrap_err();
        assert!(matches!(err, RecognitionError::EmptyUpload));
    }

    #[test]
    fn decodes_plain_and_data_url_payloads() {
        let image = png_bytes();
        let encoded = STANDARD.encode(&image);
        assert_eq!(decode_image_base64(&encoded).unwrap(), image);
        let data_url = format!("data:image/png;base64,{}", encoded);
        assert_eq!(decode_image_base64(&data_url).unwrap(), image);
        assert!(decode_image_base64("not base64!").is_err());
    }

    #[test]
    fn extracted_reading_wire_format() {
        let json = serde_json::to_value(FixedValueRecognizer::reading_for(ReadingKind::Ventilator))
            .unwrap();
        assert_eq!(json["kind"], "ventilator");
        assert_eq!(json["values"]["mode"], "AC/VC");
    }
}
