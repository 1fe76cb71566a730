//! End-to-end behaviour of the decision loop through the public API.

use tabq::{
    Action, ActionSet, DecisionLoop, Error, Feature, LearningParams, Outcome, Perception, Phase,
    QTable, RewardTable, StateEncoder, q_learning::policy::probabilities,
};

#[test]
fn test_reference_update_scenario() {
    let mut table = QTable::zeros(4, 3).unwrap();
    let value = table.update(2, 1, 1.0, 3, 0.4, 0.9).unwrap();

    assert!((value - 0.4).abs() < 1e-12);
    for (index, cell) in table.values().iter().enumerate() {
        if index != 2 * 3 + 1 {
            assert_eq!(*cell, 0.0);
        }
    }
}

#[test]
fn test_encoding_uses_feature_order_as_bit_order() {
    let encoder = StateEncoder::new(vec![Feature::TargetVisible, Feature::HoldsResource]).unwrap();
    assert_eq!(encoder.encode(&[false, false]).unwrap(), 0);
    assert_eq!(encoder.encode(&[true, false]).unwrap(), 1);
    assert_eq!(encoder.encode(&[false, true]).unwrap(), 2);
    assert_eq!(encoder.encode(&[true, true]).unwrap(), 3);

    let perception = Perception {
        target_visible: false,
        holds_resource: true,
        message_pending: true,
    };
    assert_eq!(encoder.encode_perception(&perception), 2);
}

#[test]
fn test_credit_goes_to_previous_state_and_action() {
    // Replenish is the only rewarded action, so every credited reward can be
    // traced back to the tick that earned it.
    let rewards = RewardTable::basic()
        .with_action(Action::RandomWalk, 0.0, 0.0, 0.0)
        .with_action(Action::Replenish, 1.0, 1.0, 1.0)
        .with_action(Action::ActOnTarget, 0.0, 0.0, 0.0);
    let mut agent = DecisionLoop::builder()
        .rewards(rewards)
        .learning(LearningParams::new(1.0, 0.0).unwrap())
        .seed(17)
        .build()
        .unwrap();
    let mut effector = |_: Action| Some(Outcome::Succeeded);

    let mut previous = None;
    for tick in 0..40u32 {
        let readings = [tick % 2 == 0, tick % 3 == 0];
        let report = agent.tick(&readings, &mut effector).unwrap();
        assert_eq!(agent.phase(), Phase::Idle);

        match previous {
            None => assert!(report.update.is_none()),
            Some((state, action)) => {
                let record = report.update.unwrap();
                assert_eq!((record.previous_state, record.action_taken), (state, action));
                let expected = if action == Action::Replenish { 1.0 } else { 0.0 };
                assert_eq!(record.reward, expected);
                // alpha = 1, gamma = 0: the cell holds the last credited reward.
                assert_eq!(agent.table().get(state, action.index()).unwrap(), expected);
            }
        }
        previous = Some((report.state, report.action));
    }
}

#[test]
fn test_unreported_outcome_is_penalized_as_no_effect() {
    let mut agent = DecisionLoop::builder()
        .rewards(
            RewardTable::basic()
                .with_action(Action::RandomWalk, 0.0, 0.0, -2.0)
                .with_action(Action::Replenish, 0.0, 0.0, -2.0)
                .with_action(Action::ActOnTarget, 0.0, 0.0, -2.0),
        )
        .seed(5)
        .build()
        .unwrap();
    let mut silent = |_: Action| None;

    agent.tick(&[true, true], &mut silent).unwrap();
    let report = agent.tick(&[true, true], &mut silent).unwrap();
    assert_eq!(report.outcome, Outcome::FailedNoEffect);
    assert_eq!(report.update.unwrap().reward, -2.0);
}

#[test]
fn test_zero_temperature_gives_uniform_frequencies() {
    let table = QTable::from_values(4, 3, vec![
        9.0, -9.0, 0.0, 9.0, -9.0, 0.0, 9.0, -9.0, 0.0, 9.0, -9.0, 0.0,
    ])
    .unwrap();
    assert_eq!(probabilities(table.row(0).unwrap(), 0.0), vec![1.0 / 3.0; 3]);

    let mut policy = tabq::BoltzmannPolicy::new(0.0).unwrap().with_seed(99);
    let draws = 30_000;
    let mut counts = [0usize; 3];
    for _ in 0..draws {
        counts[policy.select(&table, 1).unwrap()] += 1;
    }
    for count in counts {
        let frequency = count as f64 / draws as f64;
        assert!((frequency - 1.0 / 3.0).abs() < 0.02, "frequency {frequency}");
    }
}

#[test]
fn test_extended_agent_uses_three_features() {
    let mut agent = DecisionLoop::builder()
        .actions(ActionSet::Extended)
        .seed(2)
        .build()
        .unwrap();
    assert_eq!(agent.table().shape(), (8, 6));
    assert_eq!(agent.rewards(), &RewardTable::extended());

    let err = agent
        .tick(&[true, false], &mut |_: Action| Some(Outcome::Succeeded))
        .unwrap_err();
    assert!(matches!(err, Error::FeatureCount { expected: 3, got: 2 }));

    let report = agent
        .tick(&[true, false, true], &mut |_: Action| Some(Outcome::Succeeded))
        .unwrap();
    assert_eq!(report.state, 5);
    assert!(report.update.is_none());
}
