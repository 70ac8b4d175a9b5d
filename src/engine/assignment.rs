// ==========================================
// 礼物交换抽签系统 - 分配引擎
// ==========================================
// 算法: 随机化回溯搜索，按送礼人顺序逐个分配
// 职责: 给出满足全部排除规则的一个可行双射（首个可行解即返回）
// 红线: 无 I/O；搜索状态由单次 assign 独占
// ==========================================

use crate::domain::{Assignment, Pairing, Participant, ParticipantId};
use crate::engine::error::Infeasible;
use crate::engine::exclusion::ExclusionRules;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::debug;

// ==========================================
// SearchStats - 搜索统计（仅用于日志）
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// 尝试过的 (送礼人, 候选人) 组合数
    pub explored: u64,
    /// 被规则否决的组合数
    pub rejected: u64,
    /// 回溯次数
    pub backtracks: u64,
}

// ==========================================
// SearchState - 显式持有的搜索状态
// ==========================================
// 每层调用至多持有一条暂定配对，commit/rollback 成对出现
struct SearchState<'a> {
    pool: Vec<&'a Participant>,
    chosen: Vec<Pairing>,
    stats: SearchStats,
}

impl<'a> SearchState<'a> {
    fn new(roster: &'a [Participant]) -> Self {
        Self {
            pool: roster.iter().collect(),
            chosen: Vec::with_capacity(roster.len()),
            stats: SearchStats::default(),
        }
    }

    /// 暂定提交: 从候选池取出 pos 处候选人并记录配对
    fn commit(&mut self, giver: ParticipantId, pos: usize) {
        let candidate = self.pool.remove(pos);
        self.chosen.push(Pairing {
            giver,
            receiver: candidate.id,
        });
    }

    /// 撤销本层的暂定提交，候选人放回原位
    fn rollback(&mut self, pos: usize, candidate: &'a Participant) {
        self.chosen.pop();
        self.pool.insert(pos, candidate);
        self.stats.backtracks += 1;
    }
}

// ==========================================
// AssignmentEngine - 分配引擎
// ==========================================
pub struct AssignmentEngine<R = StdRng> {
    rng: R,
}

impl AssignmentEngine<StdRng> {
    /// 使用系统熵初始化（生产环境）
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// 固定种子（可复现的测试与排查）
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl<R: Rng> AssignmentEngine<R> {
    /// 在参与者集合自身上求配对（候选池 = 送礼人）
    ///
    /// # 说明
    /// - 候选池在搜索过程中被取出/放回，不按分支复制
    /// - 每次进入某送礼人位置都重新打乱候选顺序；打乱只影响探索顺序，不影响正确性
    ///
    /// # 返回
    /// - `Ok(Assignment)`: 按 givers 顺序排列的配对
    /// - `Err(Infeasible)`: 搜索穷尽
    pub fn assign(
        &mut self,
        givers: &[Participant],
        rules: &ExclusionRules,
    ) -> Result<Assignment, Infeasible> {
        let mut state = SearchState::new(givers);

        let found = self.search(givers, 0, &mut state, rules);

        debug!(
            givers = givers.len(),
            explored = state.stats.explored,
            rejected = state.stats.rejected,
            backtracks = state.stats.backtracks,
            found,
            "回溯搜索结束"
        );

        if found {
            Ok(Assignment::new(state.chosen))
        } else {
            Err(Infeasible {
                givers: givers.len(),
                explored: state.stats.explored,
            })
        }
    }

    fn search<'a>(
        &mut self,
        givers: &[Participant],
        index: usize,
        state: &mut SearchState<'a>,
        rules: &ExclusionRules,
    ) -> bool {
        // 全部送礼人已分配
        let Some(giver) = givers.get(index) else {
            return true;
        };

        let mut order: Vec<usize> = (0..state.pool.len()).collect();
        order.shuffle(&mut self.rng);

        for pos in order {
            let candidate = state.pool[pos];
            state.stats.explored += 1;

            if !rules.allows(giver, candidate) {
                state.stats.rejected += 1;
                continue;
            }

            state.commit(giver.id, pos);

            if self.search(givers, index + 1, state, rules) {
                return true;
            }

            state.rollback(pos, candidate);
        }

        false
    }
}

impl Default for AssignmentEngine<StdRng> {
    fn default() -> Self {
        Self::from_entropy()
    }
}
