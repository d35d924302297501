//! 정밀한 금융 값을 위한 Decimal 타입 별칭.

use rust_decimal::Decimal;

/// 금융 정밀도를 위한 가격 타입.
pub type Price = Decimal;

/// 거래량 타입 (기준 자산 단위).
pub type Volume = Decimal;
