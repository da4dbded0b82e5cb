use super::types::{PokerHand, ValidationStatus};
use crate::core::config::Config;
use crate::core::error::{HandDetectionError, Result};

/// 牌局列表的最终排序、编号和不变量检查
#[derive(Debug, Clone, Copy)]
pub struct ResultAssembler {
    min_hand_duration: f64,
    max_hand_duration: f64,
}

impl ResultAssembler {
    pub fn new(config: &Config) -> Self {
        Self {
            min_hand_duration: config.min_hand_duration,
            max_hand_duration: config.max_hand_duration,
        }
    }

    pub fn assemble(&self, mut hands: Vec<PokerHand>) -> Result<Vec<PokerHand>> {
        hands.sort_by(|a, b| {
            a.start_time
                .total_cmp(&b.start_time)
                .then(a.end_time.total_cmp(&b.end_time))
        });
        for (n, hand) in hands.iter_mut().enumerate() {
            hand.hand_id = n as u32 + 1;
        }
        self.verify(&hands)?;
        Ok(hands)
    }

    /// 只报告违规，不做修复
    pub fn verify(&self, hands: &[PokerHand]) -> Result<()> {
        for hand in hands {
            if !(hand.duration > 0.0) {
                return Err(violation(format!(
                    "hand {} has non-positive duration {:.3}s",
                    hand.hand_id, hand.duration
                )));
            }
            if hand.validation_status == ValidationStatus::Valid
                && (hand.duration < self.min_hand_duration || hand.duration > self.max_hand_duration)
            {
                return Err(violation(format!(
                    "hand {} lasts {:.1}s, outside [{:.1}, {:.1}]",
                    hand.hand_id, hand.duration, self.min_hand_duration, self.max_hand_duration
                )));
            }
        }

        for pair in hands.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            if !(a.start_time < b.start_time) {
                return Err(violation(format!(
                    "hands {} and {} share start {:.3}s",
                    a.hand_id, b.hand_id, b.start_time
                )));
            }
            if a.end_time > b.start_time {
                return Err(violation(format!(
                    "hand {} ends at {:.3}s after hand {} starts at {:.3}s",
                    a.hand_id, a.end_time, b.hand_id, b.start_time
                )));
            }
        }
        Ok(())
    }
}

fn violation(message: String) -> HandDetectionError {
    HandDetectionError::InvariantViolation(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hand(start: f64, end: f64, status: ValidationStatus) -> PokerHand {
        PokerHand::new(start, end, 0.8, status)
    }

    fn assembler() -> ResultAssembler {
        ResultAssembler::new(&Config::default())
    }

    #[test]
    fn test_orders_and_renumbers() {
        let hands = vec![
            hand(200.0, 300.0, ValidationStatus::Valid),
            hand(0.0, 85.0, ValidationStatus::Valid),
            hand(100.0, 180.0, ValidationStatus::Merged),
        ];
        let result = assembler().assemble(hands).unwrap();

        let summary: Vec<(u32, f64)> = result.iter().map(|h| (h.hand_id, h.start_time)).collect();
        assert_eq!(summary, vec![(1, 0.0), (2, 100.0), (3, 200.0)]);
    }

    #[test]
    fn test_overlap_is_an_error() {
        let hands = vec![
            hand(0.0, 120.0, ValidationStatus::Valid),
            hand(100.0, 200.0, ValidationStatus::Valid),
        ];
        let err = assembler().assemble(hands).unwrap_err();
        assert!(matches!(err, HandDetectionError::InvariantViolation(_)));
    }

    #[test]
    fn test_duplicate_start_is_an_error() {
        let hands = vec![
            hand(50.0, 100.0, ValidationStatus::Valid),
            hand(50.0, 120.0, ValidationStatus::Valid),
        ];
        assert!(assembler().assemble(hands).is_err());
    }

    #[test]
    fn test_valid_hand_out_of_bounds() {
        let err = assembler()
            .assemble(vec![hand(0.0, 10.0, ValidationStatus::Valid)])
            .unwrap_err();
        assert!(err.to_string().contains("outside"));

        // 拆分段只要求时长为正
        let ok = assembler().assemble(vec![hand(0.0, 10.0, ValidationStatus::Split)]);
        assert!(ok.is_ok());

        let zero = assembler().assemble(vec![hand(5.0, 5.0, ValidationStatus::Split)]);
        assert!(zero.is_err());
    }

    #[test]
    fn test_touching_hands_allowed() {
        let hands = vec![
            hand(0.0, 175.0, ValidationStatus::Split),
            hand(175.0, 350.0, ValidationStatus::Split),
        ];
        assert_eq!(assembler().assemble(hands).unwrap().len(), 2);
    }
}
