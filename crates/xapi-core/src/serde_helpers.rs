//! Serde adapters for xAPI members with lenient wire shapes.

/// Accepts either a single object or a list of objects and always serializes
/// a list.
///
/// xAPI allows each `contextActivities` member to be a bare activity; most
/// producers send arrays. Statements relayed from the field use both forms.
pub mod one_or_many {
  use serde::{Deserialize, Deserializer, Serialize, Serializer};

  pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
  where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
  {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany<T> {
      One(T),
      Many(Vec<T>),
    }

    match OneOrMany::deserialize(deserializer)? {
      OneOrMany::One(item) => Ok(vec![item]),
      OneOrMany::Many(items) => Ok(items),
    }
  }

  #[allow(clippy::ptr_arg)]
  pub fn serialize<S, T>(items: &Vec<T>, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: Serializer,
    T: Serialize,
  {
    serializer.collect_seq(items)
  }
}

#[cfg(test)]
mod tests {
  use serde::Deserialize;

  #[derive(Deserialize)]
  struct Holder {
    #[serde(with = "super::one_or_many")]
    items: Vec<u8>,
  }

  #[test]
  fn accepts_a_single_item() {
    let h: Holder = serde_json::from_str(r#"{"items": 7}"#).unwrap();
    assert_eq!(h.items, vec![7]);
  }

  #[test]
  fn accepts_a_list() {
    let h: Holder = serde_json::from_str(r#"{"items": [1, 2]}"#).unwrap();
    assert_eq!(h.items, vec![1, 2]);
  }
}
