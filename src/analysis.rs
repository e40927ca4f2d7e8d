//! Interface to the external style-analysis collaborator
//!
//! The engine only supplies a captured frame and the chosen style parameters;
//! it never interprets the response beyond relaying it to the host UI. The
//! wire field names follow the collaborator's camelCase contract.

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;
use crate::styles::{Gender, LengthCategory};

/// User-chosen options attached to every analysis request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisOptions {
    pub gender: Gender,
    pub current_length: LengthCategory,
    /// Target hair color name; omitted when keeping the original color
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_color: Option<String>,
    /// Response language ("ko" or "en")
    pub language: String,
}

/// A full analysis request: the captured frame plus the target style.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    /// Mirror-corrected JPEG of the captured frame, when one was taken
    pub image_jpeg: Option<Vec<u8>>,
    pub target_style_name: String,
    pub target_style_description: String,
    pub options: AnalysisOptions,
}

/// One recommended hair color in the analysis response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendedColor {
    pub name: String,
    pub hex: String,
    pub description: String,
}

/// The collaborator's styling report. Opaque to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleReport {
    /// Style name
    pub name: String,
    /// Analyzed face shape label (e.g. "Oval", "Round")
    pub face_shape: String,
    /// Order script for the hair stylist
    pub description: String,
    /// Why this style fits the user's face shape
    pub reason: String,
    /// Step-by-step home styling guide
    pub styling_tips: Vec<String>,
    /// Personal color label (e.g. "Spring Warm")
    pub personal_color: String,
    /// Reasoning for the personal color
    pub color_reason: String,
    /// Recommended hair colors
    pub recommended_colors: Vec<RecommendedColor>,
    /// Optional generated result image
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Name and description extracted from an uploaded reference photo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescribedStyle {
    pub name: String,
    pub description: String,
}

/// Capability implemented by the host application: forwards requests to the
/// remote analysis/image-generation service.
pub trait StyleAnalyzer: Send + Sync {
    /// Full analysis for a captured frame and target style.
    fn analyze(
        &self,
        request: AnalysisRequest,
    ) -> BoxFuture<'static, Result<StyleReport, AnalysisError>>;

    /// Describe the hairstyle present in an uploaded reference photo, so a
    /// custom image can stand in for a catalog template.
    fn describe_style(
        &self,
        image_jpeg: Vec<u8>,
        language: String,
    ) -> BoxFuture<'static, Result<DescribedStyle, AnalysisError>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_wire_names_are_camel_case() {
        let report = StyleReport {
            name: "Leaf Cut".to_string(),
            face_shape: "Oval".to_string(),
            description: "Layered, ear-length sides".to_string(),
            reason: "Balances the jawline".to_string(),
            styling_tips: vec!["Blow-dry forward".to_string()],
            personal_color: "Summer Cool".to_string(),
            color_reason: "Low-contrast features".to_string(),
            recommended_colors: vec![RecommendedColor {
                name: "Ash Brown".to_string(),
                hex: "#7a7065".to_string(),
                description: "Soft and muted".to_string(),
            }],
            image: None,
        };

        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("faceShape").is_some());
        assert!(json.get("stylingTips").is_some());
        assert!(json.get("personalColor").is_some());
        assert!(json.get("recommendedColors").is_some());
        assert!(json.get("image").is_none());
    }

    #[test]
    fn test_original_color_is_omitted() {
        let options = AnalysisOptions {
            gender: Gender::Female,
            current_length: LengthCategory::Medium,
            target_color: None,
            language: "en".to_string(),
        };

        let json = serde_json::to_value(&options).unwrap();
        assert!(json.get("targetColor").is_none());
        assert_eq!(json["currentLength"], "medium");
    }
}
