//! Synthetic face-analysis results.
//!
//! Nothing here looks at the uploaded pixels: every label and score is drawn
//! at random from fixed vocabularies. Only the shape of the result is
//! guaranteed (68 landmarks, scores within 0..=100).

use rand::Rng;
use serde::Serialize;

use crate::services::upload::{AcceptedUpload, MediaKind};

pub const LANDMARK_COUNT: usize = 68;
/// Landmark coordinates fall in `[0, LANDMARK_EXTENT)` on both axes.
pub const LANDMARK_EXTENT: f64 = 400.0;
pub const CONFIDENCE_SCORE: u8 = 92;

const FACE_SHAPES: [&str; 5] = ["Oval", "Round", "Square", "Heart", "Diamond"];
const SKIN_TONES: [&str; 5] = ["Fair", "Light", "Medium", "Tan", "Deep"];
const EYE_SHAPES: [&str; 5] = ["Almond", "Round", "Hooded", "Monolid", "Upturned"];
const LIP_SHAPES: [&str; 5] = ["Full", "Thin", "Heart-shaped", "Wide", "Bow-shaped"];
const SKIN_TEXTURES: [&str; 3] = ["Smooth", "Slightly textured", "Textured"];

const SUGGESTIONS: [&str; 4] = [
    "Your skin shows good hydration levels. Continue with your current moisturizing routine.",
    "Consider adding a vitamin C serum to enhance skin brightness.",
    "Your skin texture suggests good collagen production. Maintain with regular sunscreen use.",
    "Slight signs of fatigue detected. Ensure adequate sleep and hydration.",
];

const WELLNESS_TIPS: [&str; 4] = [
    "Drink at least 8 glasses of water daily for optimal skin hydration",
    "Use SPF 30+ sunscreen daily to prevent premature aging",
    "Consider a gentle exfoliation routine 2-3 times per week",
    "Maintain a consistent sleep schedule for skin repair",
];

const RECOMMENDATIONS: [Recommendation; 4] = [
    Recommendation {
        id: "1",
        category: "Foundation",
        product: "Fenty Beauty Pro Filt'r Soft Matte Foundation",
        shade: "Shade 240",
        confidence: 94,
        reason: "Perfect match for your warm medium skin tone",
        price: "$39",
        brand: "Fenty Beauty",
    },
    Recommendation {
        id: "2",
        category: "Lipstick",
        product: "Charlotte Tilbury Matte Revolution",
        shade: "Pillow Talk",
        confidence: 89,
        reason: "Complements your lip shape and skin undertones",
        price: "$37",
        brand: "Charlotte Tilbury",
    },
    Recommendation {
        id: "3",
        category: "Eyeshadow",
        product: "Urban Decay Naked3 Palette",
        shade: "Rose Gold Tones",
        confidence: 87,
        reason: "Enhances your eye shape and complements skin tone",
        price: "$54",
        brand: "Urban Decay",
    },
    Recommendation {
        id: "4",
        category: "Blush",
        product: "Glossier Cloud Paint",
        shade: "Puff",
        confidence: 85,
        reason: "Natural flush that suits your face shape",
        price: "$20",
        brand: "Glossier",
    },
];

/// Reference to the file an analysis was started for.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisSource {
    pub file_name: String,
    pub kind: MediaKind,
}

impl From<&AcceptedUpload> for AnalysisSource {
    fn from(upload: &AcceptedUpload) -> Self {
        Self {
            file_name: upload.file_name.clone(),
            kind: upload.kind,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkinCondition {
    pub texture: &'static str,
    pub hydration: u8,
    pub clarity: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FacialFeatures {
    pub face_shape: &'static str,
    pub skin_tone: &'static str,
    pub eye_shape: &'static str,
    pub lip_shape: &'static str,
    pub skin_condition: SkinCondition,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub id: &'static str,
    pub category: &'static str,
    pub product: &'static str,
    pub shade: &'static str,
    pub confidence: u8,
    pub reason: &'static str,
    pub price: &'static str,
    pub brand: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkinHealth {
    pub hydration_level: u8,
    pub elasticity: u8,
    pub evenness: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthInsights {
    pub skin_health: SkinHealth,
    pub suggestions: Vec<&'static str>,
    pub wellness_tips: Vec<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MockAnalysis {
    pub face_detected: bool,
    pub landmarks: Vec<Landmark>,
    pub facial_features: FacialFeatures,
    pub recommendations: Vec<Recommendation>,
    pub health_insights: HealthInsights,
    pub confidence_score: u8,
    pub source: AnalysisSource,
}

impl MockAnalysis {
    pub fn generate<R: Rng + ?Sized>(rng: &mut R, source: AnalysisSource) -> Self {
        let landmarks = (0..LANDMARK_COUNT)
            .map(|_| Landmark {
                x: rng.gen_range(0.0..LANDMARK_EXTENT),
                y: rng.gen_range(0.0..LANDMARK_EXTENT),
            })
            .collect();

        let facial_features = FacialFeatures {
            face_shape: pick(rng, &FACE_SHAPES),
            skin_tone: pick(rng, &SKIN_TONES),
            eye_shape: pick(rng, &EYE_SHAPES),
            lip_shape: pick(rng, &LIP_SHAPES),
            skin_condition: SkinCondition {
                texture: pick(rng, &SKIN_TEXTURES),
                hydration: percent(rng),
                clarity: percent(rng),
            },
        };

        let health_insights = HealthInsights {
            skin_health: SkinHealth {
                hydration_level: percent(rng),
                elasticity: percent(rng),
                evenness: percent(rng),
            },
            suggestions: SUGGESTIONS.to_vec(),
            wellness_tips: WELLNESS_TIPS.to_vec(),
        };

        Self {
            face_detected: true,
            landmarks,
            facial_features,
            recommendations: RECOMMENDATIONS.to_vec(),
            health_insights,
            confidence_score: CONFIDENCE_SCORE,
            source,
        }
    }

    /// Short chat-style digest of the result.
    pub fn summary(&self) -> String {
        let features = &self.facial_features;
        let mut lines = vec![
            "Analysis Complete!".to_string(),
            String::new(),
            "Facial Features Detected:".to_string(),
            format!("- Face Shape: {}", features.face_shape),
            format!("- Skin Tone: {}", features.skin_tone),
            format!("- Eye Shape: {}", features.eye_shape),
            format!("- Lip Shape: {}", features.lip_shape),
            String::new(),
            "Top Recommendations:".to_string(),
        ];
        lines.extend(
            self.recommendations
                .iter()
                .take(2)
                .map(|r| format!("- {} ({}% match)", r.product, r.confidence)),
        );
        lines.push(String::new());
        lines.push("Health Insights:".to_string());
        lines.push(format!(
            "- Skin hydration: {}%",
            self.health_insights.skin_health.hydration_level
        ));
        lines.join("\n")
    }
}

fn pick<R: Rng + ?Sized>(rng: &mut R, options: &[&'static str]) -> &'static str {
    options[rng.gen_range(0..options.len())]
}

// Matches a floor(random * 100) draw: 0..=99.
fn percent<R: Rng + ?Sized>(rng: &mut R) -> u8 {
    rng.gen_range(0..100)
}
