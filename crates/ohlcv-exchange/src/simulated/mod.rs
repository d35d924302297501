//! 외부 네트워크 없이 동작하는 시뮬레이션 캔들 제공자.
//!
//! 결정적인 캔들 격자를 생성하므로 같은 요청은 항상 같은 결과를 돌려줍니다.
//! 호출 기록과 요청당 한도, 실패 주입을 지원해 조회 레이어 테스트에 사용합니다.
//!
//! ```ignore
//! use ohlcv_exchange::simulated::SimulatedProvider;
//!
//! let provider = SimulatedProvider::new().with_request_limit(500);
//! let candles = provider.get_candles_between(&request).await?;
//! assert_eq!(provider.call_count(), 1);
//! ```

mod data_feed;
mod provider;

pub use data_feed::{align_to_period, generate_candles};
pub use provider::SimulatedProvider;
