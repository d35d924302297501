//! CandleRetriever 구현체.
//!
//! 업스트림 커넥터를 래핑하여 조회 레이어가 사용하는 CandleRetriever 인터페이스를 제공합니다.

mod binance;

pub use binance::BinanceKlineProvider;
