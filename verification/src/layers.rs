//! Which layers run for a quest.

use quest_types::{LayerKind, QuestRequirement};

/// Resolve the layers for `requirement`, sorted by priority and de-duplicated.
///
/// An explicit non-empty list wins. Otherwise layers are detected from what
/// the quest configures, falling back to GPS plus AI vision.
pub fn select_layers(requirement: &QuestRequirement) -> Vec<LayerKind> {
    let mut layers = if requirement.layers.is_empty() {
        detect_layers(requirement)
    } else {
        requirement.layers.clone()
    };
    layers.sort();
    layers.dedup();
    layers
}

fn detect_layers(requirement: &QuestRequirement) -> Vec<LayerKind> {
    let mut layers = Vec::new();
    if requirement.location.is_some() {
        layers.push(LayerKind::Gps);
    }
    if requirement.time_window.as_ref().is_some_and(|w| w.enabled) {
        layers.push(LayerKind::Time);
    }
    if requirement.qr_code_hash.is_some() {
        layers.push(LayerKind::QrScan);
    }
    if requirement.ai.as_ref().is_some_and(|ai| ai.enabled) {
        layers.push(LayerKind::AiVision);
    }
    if layers.is_empty() {
        layers = vec![LayerKind::Gps, LayerKind::AiVision];
    }
    layers
}
