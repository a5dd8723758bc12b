use heroshot::cover::{CoverAction, CoverState, reduce};
use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};

fn random_action(rng: &mut StdRng, state: &CoverState, step: usize) -> CoverAction {
    match rng.random_range(0..4) {
        0 => CoverAction::AddStyle {
            label: format!("style {step}"),
            prompt: format!("prompt {step}"),
        },
        1 => CoverAction::DeleteStyle("not-a-style".to_string()),
        _ => {
            let index = rng.random_range(0..state.styles.len());
            CoverAction::DeleteStyle(state.styles[index].id.clone())
        }
    }
}

#[test]
fn catalog_invariants_hold_for_random_add_delete_sequences() {
    for seed in 0..20 {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut state = CoverState::default();
        for step in 0..200 {
            let action = random_action(&mut rng, &state, step);
            state = reduce(state, action);
            assert!(!state.styles.is_empty(), "seed {seed} step {step}");
            let selected = state
                .style(&state.selected_style_id)
                .unwrap_or_else(|| panic!("dangling selection, seed {seed} step {step}"));
            assert!(!selected.id.is_empty());
        }
    }
}

#[test]
fn manual_prompt_is_kept_until_the_selection_changes() {
    let state = [
        CoverAction::SetActivePrompt("custom text".to_string()),
        CoverAction::DeleteStyle("neon_cyber".to_string()),
    ]
    .into_iter()
    .fold(CoverState::default(), reduce);
    assert_eq!(state.active_prompt, "custom text");

    let state = reduce(state, CoverAction::SelectStyle("warm_japanese".to_string()));
    let preset = state.style("warm_japanese").expect("preset");
    assert_eq!(state.active_prompt, preset.prompt);
}

#[test]
fn added_styles_survive_deleting_every_preset() {
    let mut state = reduce(
        CoverState::default(),
        CoverAction::AddStyle {
            label: "Mine".to_string(),
            prompt: "paper cut-out".to_string(),
        },
    );
    let presets: Vec<String> = state
        .styles
        .iter()
        .filter(|style| style.is_default)
        .map(|style| style.id.clone())
        .collect();
    for id in presets {
        state = reduce(state, CoverAction::DeleteStyle(id));
    }
    assert_eq!(state.styles.len(), 1);
    assert_eq!(state.styles[0].label, "Mine");
    assert_eq!(state.selected_style_id, state.styles[0].id);
    assert_eq!(state.active_prompt, "paper cut-out");
}
