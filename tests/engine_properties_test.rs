// ==========================================
// 分配引擎性质测试
// ==========================================
// 测试目标: 双射无不动点 / 组内不配对 / 历史回避 / 无解判定
// 方法: 多个固定种子反复运行
// ==========================================

use secret_santa::domain::{Assignment, HistoryMap, Participant, ParticipantId};
use secret_santa::engine::{AssignmentEngine, ExclusionRules};
use std::collections::{BTreeSet, HashMap};

const SEEDS: std::ops::Range<u64> = 0..200;

fn person(id: i64, group: i64) -> Participant {
    Participant::new(id, format!("P{}", id), "", group, None)
}

fn ids(roster: &[Participant]) -> BTreeSet<ParticipantId> {
    roster.iter().map(|p| p.id).collect()
}

fn group_of(roster: &[Participant]) -> HashMap<ParticipantId, i64> {
    roster.iter().map(|p| (p.id, p.group.0)).collect()
}

fn assert_valid(roster: &[Participant], assignment: &Assignment, history: &HistoryMap) {
    assert!(assignment.is_derangement_of(&ids(roster)), "必须是无不动点的双射");

    let groups = group_of(roster);
    for pair in assignment.pairs() {
        assert_ne!(groups[&pair.giver], groups[&pair.receiver], "组内配对: {:?}", pair);
        assert_ne!(history.previous_receiver(pair.giver), Some(pair.receiver), "重复上一轮: {:?}", pair);
    }
}

#[test]
fn test_mixed_roster_properties_hold_for_many_seeds() {
    let roster = vec![
        person(1, 1),
        person(2, 1),
        person(3, 1),
        person(4, 2),
        person(5, 2),
        person(6, 3),
        person(7, 4),
        person(8, 4),
    ];
    let history: HistoryMap = [(1, 4), (4, 1), (6, 7), (7, 2)]
        .into_iter()
        .map(|(g, r)| (ParticipantId(g), ParticipantId(r)))
        .collect();
    let rules = ExclusionRules::standard(history.clone());

    for seed in SEEDS {
        let assignment = AssignmentEngine::with_seed(seed).assign(&roster, &rules).unwrap();
        assert_valid(&roster, &assignment, &history);
    }
}

#[test]
fn test_two_families_only_cross_pairs() {
    // A,B 属于 1 组；C,D 属于 2 组
    let roster = vec![person(1, 1), person(2, 1), person(3, 2), person(4, 2)];
    let rules = ExclusionRules::standard(HistoryMap::new());
    let cross: BTreeSet<i64> = [3, 4].into_iter().collect();
    let home: BTreeSet<i64> = [1, 2].into_iter().collect();

    for seed in SEEDS {
        let assignment = AssignmentEngine::with_seed(seed).assign(&roster, &rules).unwrap();
        for pair in assignment.pairs() {
            if home.contains(&pair.giver.0) {
                assert!(cross.contains(&pair.receiver.0));
            } else {
                assert!(home.contains(&pair.receiver.0));
            }
        }
        // A 永远不会收到 B 的礼物
        assert_ne!(assignment.receiver_of(ParticipantId(2)), Some(ParticipantId(1)));
    }
}

#[test]
fn test_single_group_is_always_infeasible() {
    let rules = ExclusionRules::standard(HistoryMap::new());
    for n in 2..=6 {
        let roster: Vec<Participant> = (1..=n).map(|i| person(i, 42)).collect();
        for seed in 0..10 {
            let result = AssignmentEngine::with_seed(seed).assign(&roster, &rules);
            assert!(result.is_err(), "n={} seed={} 应无解", n, seed);
        }
    }
}

#[test]
fn test_previous_round_never_repeated() {
    // 2024: A→B, C→D
    let roster = vec![person(1, 1), person(2, 2), person(3, 3), person(4, 4)];
    let history: HistoryMap = [(1, 2), (3, 4)]
        .into_iter()
        .map(|(g, r)| (ParticipantId(g), ParticipantId(r)))
        .collect();
    let rules = ExclusionRules::standard(history.clone());

    for seed in SEEDS {
        let assignment = AssignmentEngine::with_seed(seed).assign(&roster, &rules).unwrap();
        assert_ne!(assignment.receiver_of(ParticipantId(1)), Some(ParticipantId(2)));
        assert_ne!(assignment.receiver_of(ParticipantId(3)), Some(ParticipantId(4)));
        assert_valid(&roster, &assignment, &history);
    }
}

#[test]
fn test_exploration_order_varies() {
    let roster: Vec<Participant> = (1..=6).map(|i| person(i, i)).collect();
    let rules = ExclusionRules::standard(HistoryMap::new());

    let distinct: BTreeSet<Vec<(i64, i64)>> = SEEDS
        .map(|seed| {
            AssignmentEngine::with_seed(seed)
                .assign(&roster, &rules)
                .unwrap()
                .pairs()
                .iter()
                .map(|p| (p.giver.0, p.receiver.0))
                .collect()
        })
        .collect();

    assert!(distinct.len() > 10, "不同种子应产生多样的结果");
}
