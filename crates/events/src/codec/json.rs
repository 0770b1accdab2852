//! JSON codec.
//!
//! Events are encoded as an envelope `{"eventType": ..., "payload": ...}`.

use super::{EventMarshaller, EventMetadata, EventUnmarshaller, MarshalError, UnmarshalError};
use crate::event::{Event, Message, QoS};

use serde::{Deserialize, Serialize};
use serde_value::Value;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EventDataRef<'a> {
    event_type: &'a str,
    payload: &'a Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventData {
    event_type: String,
    payload: Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Metadata {
    event_type: String,
}

/// Encodes events as JSON.
///
/// Messages use the delivery mode of the event unless a fixed QoS is set.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonMarshaller {
    qos: Option<QoS>,
}

impl JsonMarshaller {
    /// Creates a marshaller that keeps each event's delivery mode.
    #[must_use]
    pub const fn new() -> Self {
        Self { qos: None }
    }

    /// Creates a marshaller that sends every message with the given QoS.
    #[must_use]
    pub const fn with_qos(qos: QoS) -> Self {
        Self { qos: Some(qos) }
    }
}

impl EventMarshaller for JsonMarshaller {
    fn marshal(&self, event: &Event<Value>) -> Result<Message, MarshalError> {
        let data = EventDataRef {
            event_type: event.event_type(),
            payload: event.payload(),
        };

        let bytes = serde_json::to_vec(&data).map_err(|e| MarshalError::Encode(e.to_string()))?;

        Ok(Message::new(
            event.topic(),
            self.qos.unwrap_or_else(|| event.delivery_mode()),
            bytes,
        ))
    }
}

/// Decodes JSON envelopes.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonUnmarshaller;

impl EventUnmarshaller for JsonUnmarshaller {
    fn metadata(&self, message: &Message) -> Result<EventMetadata, UnmarshalError> {
        let metadata: Metadata = serde_json::from_slice(&message.payload)
            .map_err(|e| UnmarshalError::Metadata(e.to_string()))?;

        Ok(EventMetadata {
            event_type: metadata.event_type,
        })
    }

    fn unmarshal(&self, message: &Message) -> Result<Event<Value>, UnmarshalError> {
        let data: EventData = serde_json::from_slice(&message.payload)
            .map_err(|e| UnmarshalError::Envelope(e.to_string()))?;

        Ok(Event::new(message.topic.clone(), data.event_type, data.payload)
            .with_delivery_mode(message.qos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{erase, restore};

    use std::collections::{BTreeMap, HashMap};

    use serde::Deserialize;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Person {
        first_name: String,
        last_name: String,
        birthday: Option<u64>,
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(tag = "kind")]
    enum Shape {
        Circle { radius: f64 },
        Square { side: f64 },
    }

    fn round_trip<T>(event: Event<T>) -> Event<T>
    where
        T: Serialize + serde::de::DeserializeOwned,
    {
        let message = JsonMarshaller::new().marshal(&erase(event).unwrap()).unwrap();
        restore(JsonUnmarshaller.unmarshal(&message).unwrap()).unwrap()
    }

    #[test]
    fn test_envelope_format() {
        let event = erase(Event::new("sample/topic", "sample-type", "hello")).unwrap();
        let message = JsonMarshaller::new().marshal(&event).unwrap();

        assert_eq!(message.topic, "sample/topic");
        assert_eq!(message.qos, QoS::AtMostOnce);
        assert_eq!(
            message.payload_str(),
            Some(r#"{"eventType":"sample-type","payload":"hello"}"#)
        );
    }

    #[test]
    fn test_qos_follows_event_unless_fixed() {
        let event = erase(
            Event::new("sample/topic", "sample-type", 1).with_delivery_mode(QoS::AtLeastOnce),
        )
        .unwrap();

        let message = JsonMarshaller::new().marshal(&event).unwrap();
        assert_eq!(message.qos, QoS::AtLeastOnce);

        let message = JsonMarshaller::with_qos(QoS::AtMostOnce)
            .marshal(&event)
            .unwrap();
        assert_eq!(message.qos, QoS::AtMostOnce);
    }

    #[test]
    fn test_round_trip_payloads() {
        let person = Person {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            birthday: Some(1_815),
        };
        let event = Event::new("people", "person", person.clone());
        let decoded = round_trip(event.clone());
        assert_eq!(decoded, event);

        let shapes = vec![Shape::Circle { radius: 1.5 }, Shape::Square { side: 2.0 }];
        let decoded = round_trip(Event::new("shapes", "batch", shapes.clone()));
        assert_eq!(decoded.payload(), &shapes);

        let mut counts = BTreeMap::new();
        counts.insert("a".to_string(), 1_u32);
        counts.insert("b".to_string(), 2_u32);
        let decoded = round_trip(Event::new("counts", "tally", counts.clone()));
        assert_eq!(decoded.payload(), &counts);
        assert_eq!(decoded.event_type(), "tally");

        let mut names = BTreeMap::new();
        names.insert(1_u32, "one".to_string());
        names.insert(20_u32, "twenty".to_string());
        let decoded = round_trip(Event::new("numbers", "names", names.clone()));
        assert_eq!(decoded.payload(), &names);

        let mut flags = HashMap::new();
        flags.insert(-7_i64, true);
        flags.insert(42_i64, false);
        let decoded = round_trip(Event::new("numbers", "flags", flags.clone()));
        assert_eq!(decoded.payload(), &flags);

        let decoded = round_trip(Event::new("empty", "unit", ()));
        assert_eq!(decoded.payload(), &());

        let decoded = round_trip(Event::new("empty", "none", None::<u32>));
        assert_eq!(decoded.payload(), &None);
    }

    #[test]
    fn test_integer_keys_are_encoded_as_strings() {
        let mut names = BTreeMap::new();
        names.insert(1_u32, "one");
        let message = JsonMarshaller::new()
            .marshal(&erase(Event::new("numbers", "names", names)).unwrap())
            .unwrap();

        assert_eq!(
            message.payload_str(),
            Some(r#"{"eventType":"names","payload":{"1":"one"}}"#)
        );
    }

    #[test]
    fn test_metadata_only() {
        let message = Message::new(
            "sample/topic",
            QoS::AtMostOnce,
            r#"{"payload":{"deeply":{"nested":[1,2,3]}},"eventType":"sample-type"}"#,
        );

        let metadata = JsonUnmarshaller.metadata(&message).unwrap();
        assert_eq!(metadata.event_type, "sample-type");
    }

    #[test]
    fn test_decode_sample_message() {
        let message = Message::new(
            "sample/topic",
            QoS::AtLeastOnce,
            r#"{"eventType":"sample-type","payload":"hello"}"#,
        );

        let event: Event<String> = restore(JsonUnmarshaller.unmarshal(&message).unwrap()).unwrap();
        assert_eq!(event.topic(), "sample/topic");
        assert_eq!(event.event_type(), "sample-type");
        assert_eq!(event.payload(), "hello");
        assert_eq!(event.delivery_mode(), QoS::AtLeastOnce);
    }

    #[test]
    fn test_malformed_messages() {
        let not_json = Message::new("t", QoS::AtMostOnce, "not json");
        assert!(matches!(
            JsonUnmarshaller.metadata(&not_json),
            Err(UnmarshalError::Metadata(_))
        ));
        assert!(matches!(
            JsonUnmarshaller.unmarshal(&not_json),
            Err(UnmarshalError::Envelope(_))
        ));

        let no_type = Message::new("t", QoS::AtMostOnce, r#"{"payload":1}"#);
        assert!(JsonUnmarshaller.metadata(&no_type).is_err());
    }

    #[test]
    fn test_unrepresentable_payload() {
        let mut map = HashMap::new();
        map.insert((1_u8, 2_u8), "pair");
        let event = erase(Event::new("t", "e", map)).unwrap();

        assert!(matches!(
            JsonMarshaller::new().marshal(&event),
            Err(MarshalError::Encode(_))
        ));
    }
}
