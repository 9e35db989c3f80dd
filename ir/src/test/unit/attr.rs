use test_case::test_case;

use crate::{AttrValue, DataType, TensorValue};

#[test_case(AttrValue::Int(3), AttrValue::Int(3), true; "equal_ints")]
#[test_case(AttrValue::Int(3), AttrValue::Int(4), false; "different_ints")]
#[test_case(AttrValue::Float(0.0), AttrValue::Float(-0.0), false; "signed_zero_differs")]
#[test_case(AttrValue::Float(f64::NAN), AttrValue::Float(f64::NAN), true; "same_nan_bits")]
#[test_case(AttrValue::ListInt(vec![1, 2]), AttrValue::Shape(vec![1, 2]), false; "list_is_not_shape")]
#[test_case(AttrValue::from("a"), AttrValue::from("a".to_string()), true; "str_conversions")]
#[test_case(AttrValue::ListStr(vec!["ab".into()]), AttrValue::ListStr(vec!["a".into(), "b".into()]), false; "length_prefixed")]
fn test_bytes_eq(lhs: AttrValue, rhs: AttrValue, expected: bool) {
    assert_eq!(lhs.bytes_eq(&rhs), expected);
}

#[test]
fn test_tensor_payload_comparison() {
    let a = AttrValue::from(TensorValue::from_f32s(&[1.0, 2.0]));
    let b = AttrValue::from(TensorValue::from_f32s(&[1.0, 2.0]));
    let c = AttrValue::from(TensorValue::from_f32s(&[1.0, 2.5]));
    let reshaped = AttrValue::from(TensorValue::new(DataType::Float32, [1, 2], match &a {
        AttrValue::Tensor(t) => t.data.clone(),
        _ => unreachable!(),
    }));

    assert!(a.bytes_eq(&b));
    assert!(!a.bytes_eq(&c));
    assert!(!a.bytes_eq(&reshaped));
}

#[test]
fn test_display() {
    assert_eq!(AttrValue::from("s").to_string(), "\"s\"");
    assert_eq!(TensorValue::scalar_i64(1).to_string(), "tensor<int64, [], 8 bytes>");
}

#[test_case(DataType::Bool, "bool")]
#[test_case(DataType::UInt8, "uint8")]
#[test_case(DataType::BFloat16, "bfloat16")]
#[test_case(DataType::Float64, "float64")]
fn test_dtype_names(dtype: DataType, name: &str) {
    assert_eq!(dtype.to_string(), name);
}
