use std::sync::Arc;

use wizard::prelude::*;

type Service = TurnService<StandardResolver, ChannelBroadcaster>;

/// Matches that stall (everyone out of PP) end in a draw here.
const TURN_LIMIT: u32 = 60;

// ---------------------------------------------------------------------------
// Rosters
// ---------------------------------------------------------------------------

fn knight() -> Unit {
    Unit::new("knight", 40, 12, 10, 5)
        .with_move("slash", 30, 10)
        .with_move("bash", 15, 20)
}

fn mage() -> Unit {
    Unit::new("mage", 30, 15, 6, 9)
        .with_move("bolt", 40, 5)
        .with_move("spark", 20, 15)
}

fn golem() -> Unit {
    Unit::new("golem", 60, 8, 14, 2).with_move("slam", 25, 10)
}

fn starting_battle() -> BattleState {
    let inventory = Inventory {
        potions: 2,
        hyper_potions: 1,
        ..Inventory::default()
    };
    BattleState::new(
        Side::new(vec![knight(), mage()], inventory),
        Side::new(vec![mage(), golem()], inventory),
    )
}

// ---------------------------------------------------------------------------
// A very simple player
// ---------------------------------------------------------------------------

/// Picks this seat's orders for the next turn.
///
/// Brings in a standing unit if the active one fainted, heals when low,
/// otherwise attacks with the strongest move that has PP left.
fn choose(state: &BattleState, seat: Seat) -> (Vec<Action>, Vec<Swap>) {
    let side = state.side(seat);
    let mut swaps = Vec::new();
    let mut acting = side.active_unit();

    if acting.is_none_or(Unit::is_fainted) {
        if let Some((slot, unit)) = side
            .roster
            .iter()
            .enumerate()
            .find(|(_, u)| !u.is_fainted())
        {
            swaps.push(Swap(slot));
            acting = Some(unit);
        }
    }
    let Some(unit) = acting else {
        return (vec![Action::Guard], swaps);
    };

    if unit.hp * 3 < unit.max_hp {
        for item in [ItemKind::Potion, ItemKind::HyperPotion] {
            if side.inventory.count(item) > 0 {
                return (vec![Action::UseItem { item }], swaps);
            }
        }
    }

    let best = unit
        .moves
        .iter()
        .enumerate()
        .filter(|(_, m)| m.pp > 0)
        .max_by_key(|(_, m)| m.power)
        .map(|(slot, _)| slot);
    match best {
        Some(move_slot) => (vec![Action::Attack { move_slot }], swaps),
        None => (vec![Action::Guard], swaps),
    }
}

/// Plays one seat until the match ends, submitting JSON through the
/// service exactly as a remote client would.
async fn play(
    service: Arc<Service>,
    lobby: Arc<Lobby>,
    seat: Seat,
    mut events: EventReceiver,
    mut state: BattleState,
) -> Result<Option<Outcome>, WizardError> {
    let me = lobby.players()[seat.index()].clone();

    loop {
        let (turn_actions, turn_swap) = choose(&state, seat);
        let request = TurnRequest {
            lobby_id: lobby.id(),
            player_id: me.id,
            token: me.token.clone(),
            turn_actions,
            turn_swap,
        };
        let reply = service
            .handle(&JsonCodec, &JsonCodec.encode(&request)?)
            .await?;
        let reply: TurnReply = JsonCodec.decode(&reply)?;
        if let TurnReply::Rejected { code, message } = reply {
            tracing::warn!(%seat, code, %message, "submission rejected");
            return Err(WizardError::Internal(message));
        }

        // Wait for the turn to finish before choosing again.
        loop {
            match events.recv().await {
                Some(GameEvent::TurnResolved {
                    result,
                    state: next,
                    game_over,
                    ..
                }) => {
                    tracing::debug!(%seat, turn = result.turn, events = result.events.len(), "turn finished");
                    state = next;
                    if game_over {
                        return Ok(result.outcome);
                    }
                    break;
                }
                Some(GameEvent::TurnFailed { turn, reason, .. }) => {
                    tracing::warn!(%seat, turn, %reason, "turn failed, resubmitting");
                    break;
                }
                Some(GameEvent::GameInfo { .. }) => {}
                None => return Ok(None),
            }
        }
    }
}

/// Runs one full match between two simulated players.
async fn run_duel() -> Result<Option<Outcome>, WizardError> {
    let registry = Arc::new(LobbyRegistry::new());
    let broadcaster = Arc::new(ChannelBroadcaster::new());
    let service = Arc::new(TurnService::new(
        Arc::clone(&registry),
        StandardResolver::with_turn_limit(TURN_LIMIT),
        Arc::clone(&broadcaster),
        ServiceConfig::default(),
    ));

    let lobby = registry.create_lobby(PlayerId(1), PlayerId(2)).await;
    let battle = starting_battle();
    service.start_game(lobby.id(), battle.clone()).await?;

    let players: Vec<_> = Seat::BOTH
        .into_iter()
        .map(|seat| {
            let events = broadcaster.connect(lobby.players()[seat.index()].token.clone());
            tokio::spawn(play(
                Arc::clone(&service),
                Arc::clone(&lobby),
                seat,
                events,
                battle.clone(),
            ))
        })
        .collect();

    let mut outcome = None;
    for player in players {
        outcome = player
            .await
            .map_err(|e| WizardError::Internal(e.to_string()))??;
    }
    registry.end_lobby(lobby.id()).await;
    Ok(outcome)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match run_duel().await? {
        Some(Outcome::Winner(seat)) => tracing::info!(%seat, "duel won"),
        Some(Outcome::Draw) => tracing::info!("duel drawn"),
        None => tracing::warn!("duel ended without a result"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_choose_attacks_with_strongest_move() {
        let (actions, swaps) = choose(&starting_battle(), Seat::One);
        assert_eq!(actions, vec![Action::Attack { move_slot: 0 }]);
        assert!(swaps.is_empty());
    }

    #[test]
    fn test_choose_swaps_in_standing_unit_after_faint() {
        let mut state = starting_battle();
        state.side_mut(Seat::Two).roster[0].hp = 0;

        let (actions, swaps) = choose(&state, Seat::Two);
        assert_eq!(swaps, vec![Swap(1)]);
        assert_eq!(actions, vec![Action::Attack { move_slot: 0 }]);
    }

    #[test]
    fn test_choose_heals_when_low() {
        let mut state = starting_battle();
        state.side_mut(Seat::One).roster[0].hp = 5;

        let (actions, _) = choose(&state, Seat::One);
        assert_eq!(
            actions,
            vec![Action::UseItem {
                item: ItemKind::Potion
            }]
        );
    }

    #[test]
    fn test_choose_output_passes_validation() {
        let state = starting_battle();
        for seat in Seat::BOTH {
            let (actions, swaps) = choose(&state, seat);
            assert!(
                validate(&state, seat, &actions, &swaps, &RulesConfig::default()).is_ok(),
                "{seat} chose illegal orders"
            );
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_run_duel_reaches_an_outcome() {
        let outcome = run_duel().await.unwrap();
        assert!(outcome.is_some());
    }
}
