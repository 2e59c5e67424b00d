use bevy::prelude::*;

use super::*;
use crate::common::test_utils::run_system_once;

#[test]
fn panels_toggle_without_duplicates() {
    let mut hud = HudState::default();
    hud.apply(&HudCommand::Panel { panel: Panel::Shop, visible: true });
    hud.apply(&HudCommand::Panel { panel: Panel::Shop, visible: true });
    assert_eq!(hud.panels, vec![Panel::Shop]);

    hud.apply(&HudCommand::Panel { panel: Panel::Shop, visible: false });
    assert!(!hud.shows(Panel::Shop));
}

#[test]
fn hiding_boss_display_clears_health() {
    let mut hud = HudState::default();
    hud.apply(&HudCommand::BossDisplay { name: "X".into(), visible: true });
    hud.apply(&HudCommand::HealthBar { fraction: 0.4 });
    assert_eq!(hud.boss_name.as_deref(), Some("X"));

    hud.apply(&HudCommand::BossDisplay { name: "X".into(), visible: false });
    assert!(hud.boss_name.is_none());
    assert!(hud.health.is_none());
}

#[test]
fn timer_turns_critical_below_fraction() {
    assert_eq!(timer_color(0.5, 0.2), TIMER_NORMAL);
    assert_eq!(timer_color(0.19, 0.2), TIMER_CRITICAL);
}

#[test]
fn fold_reads_both_channels() {
    let mut world = World::new();
    world.init_resource::<HudState>();
    world.init_resource::<Messages<HudCommand>>();
    world.init_resource::<Messages<AudioCue>>();

    world.write_message(HudCommand::Coins(7));
    world.write_message(AudioCue::Music("theme".into()));
    world.write_message(AudioCue::Footstep);

    run_system_once(&mut world, fold_presentation);

    let hud = world.resource::<HudState>();
    assert_eq!(hud.coins, 7);
    assert_eq!(hud.music.as_deref(), Some("theme"));
    assert_eq!(hud.footsteps, 1);
}
