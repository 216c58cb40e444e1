#![no_main]

use libfuzzer_sys::fuzz_target;
use quest_types::AiRequirements;
use quest_vision::{apply_local_policy, ClassifierResponse};

fuzz_target!(|data: &[u8]| {
    // Arbitrary classifier bodies must either parse or be rejected, never panic.
    let Ok(response) = serde_json::from_slice::<ClassifierResponse>(data) else {
        return;
    };

    let requirements = AiRequirements {
        required_objects: vec!["door".into(), "Fountain".into()],
        require_face: true,
        require_selfie: true,
        ..AiRequirements::default()
    };
    let verdict = apply_local_policy(&response, &requirements);

    // Local policy can only take a pass away.
    if verdict.passed {
        assert!(response.passed);
        assert!(verdict.overrides.is_empty());
    }
});
