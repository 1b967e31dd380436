// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Publisher and subscription lifecycle plus publish forwarding.

mod common;

use std::any::Any;
use std::cell::RefCell;

use common::{MockMiddleware, BROKEN, SWAPPED_U32, U32};
use hdds_micro_rcl::{
    Client, ClientConfig, Error, MessageType, NodeHandle, PublisherConfig, PublisherHandle, QosPolicy,
    Reliability, SubscriptionConfig, SubscriptionHandle, MAX_TOPIC_NAME_LEN,
};

fn ready<'a>() -> Client<'a, MockMiddleware, 2, 2, 2> {
    let mut client = Client::new(MockMiddleware::new());
    client.init(&ClientConfig::default()).unwrap();
    client
}

fn ignore(_: SubscriptionHandle, _: &[u8], _: Option<&dyn Any>) {}

#[test]
fn test_publisher_create_validates_queue_and_buffer() {
    let mut zero = [0u8; 8];
    let mut short = [0u8; 7];
    let mut exact = [0u8; 8];
    static EMPTY: MessageType = MessageType::new("test/Empty", 0, common::copy, common::copy);
    let mut empty_buf = [0u8; 8];

    let mut client = ready();
    let node = client.node_create("talker", "").unwrap();

    assert_eq!(client.publisher_create(node, &U32, 0, &mut zero, None), Err(Error::InvalidParameter));
    assert_eq!(client.publisher_create(node, &U32, 2, &mut short, None), Err(Error::InvalidParameter));
    assert_eq!(client.publisher_create(node, &EMPTY, 1, &mut empty_buf, None), Err(Error::InvalidParameter));
    assert_eq!(client.middleware().calls.publisher_create, 0);

    let publisher = client.publisher_create(node, &U32, 2, &mut exact, None).unwrap();
    assert_eq!(publisher.node(), node);
    assert_eq!(client.middleware().create_buffers, vec![8]);
}

#[test]
fn test_publisher_defaults_and_topic() {
    let mut a = [0u8; 4];
    let mut b = [0u8; 4];
    let config = PublisherConfig {
        topic_name: Some("/chatter"),
        qos: QosPolicy::RELIABLE,
        ..PublisherConfig::default()
    };

    let mut client = ready();
    let node = client.node_create("talker", "").unwrap();
    let plain = client.publisher_create(node, &U32, 1, &mut a, None).unwrap();
    let named = client.publisher_create(node, &U32, 1, &mut b, Some(&config)).unwrap();

    assert_eq!(client.publisher_topic_name(plain), None);
    assert_eq!(client.publisher_qos(plain), Some(QosPolicy::BEST_EFFORT));
    assert!(client.publisher_user_metadata(plain).is_none());
    assert_eq!(client.publisher_topic_name(named), Some("/chatter"));
    assert_eq!(client.publisher_qos(named).map(|q| q.reliability), Some(Reliability::Reliable));
    assert_eq!(client.middleware().topics, vec!["", "/chatter"]);
}

static POSE: MessageType = MessageType::new(
    "geometry_msgs/msg/PoseWithCovarianceStamped",
    4,
    common::copy,
    common::copy,
);
static UNNAMED: MessageType = MessageType::new("", 4, common::copy, common::copy);

#[test]
fn test_publisher_create_with_filled_defaults() {
    assert!(POSE.name().len() > MAX_TOPIC_NAME_LEN);
    let mut a = [0u8; 4];
    let mut b = [0u8; 4];
    let metadata = 1u8;
    let mut config = PublisherConfig {
        qos: QosPolicy::RELIABLE,
        user_metadata: Some(&metadata),
        topic_name: Some("/stale"),
        ..PublisherConfig::default()
    };
    config.fill_defaults();

    let mut client = ready();
    let node = client.node_create("talker", "").unwrap();
    let pose = client.publisher_create(node, &POSE, 1, &mut a, Some(&config)).unwrap();
    let unnamed = client.publisher_create(node, &UNNAMED, 1, &mut b, Some(&config)).unwrap();

    for publisher in [pose, unnamed] {
        assert_eq!(client.publisher_qos(publisher), Some(QosPolicy::BEST_EFFORT));
        assert!(client.publisher_user_metadata(publisher).is_none());
        assert_eq!(client.publisher_topic_name(publisher), None);
    }
    assert_eq!(client.publisher_message_type(pose).map(MessageType::name), Some(POSE.name()));
    assert_eq!(client.publisher_count(node), Ok(2));

    client.publish(pose, &[7; 4]).unwrap();
    assert_eq!(client.middleware().published.len(), 1);
}

#[test]
fn test_subscription_create_with_filled_defaults() {
    let mut buf = [0u8; 4];
    let metadata = 1u8;
    let mut config = SubscriptionConfig {
        qos: QosPolicy::RELIABLE,
        user_metadata: Some(&metadata),
        ..SubscriptionConfig::default()
    };
    config.fill_defaults();

    let mut client = ready();
    let node = client.node_create("listener", "").unwrap();
    let sub = client
        .subscription_create(node, &POSE, "/pose", &ignore, 1, &mut buf, Some(&config))
        .unwrap();

    assert_eq!(client.subscription_qos(sub), Some(QosPolicy::BEST_EFFORT));
    assert!(client.subscription_user_metadata(sub).is_none());
    assert_eq!(client.subscription_topic_name(sub), Some("/pose"));
    assert_eq!(client.subscription_message_type(sub).map(MessageType::name), Some(POSE.name()));
}

#[test]
fn test_fill_defaults_resets_config() {
    let metadata = 5u8;
    let mut config = PublisherConfig {
        serialize: Some(common::copy),
        qos: QosPolicy::RELIABLE,
        user_metadata: Some(&metadata),
        ..PublisherConfig::default()
    };
    config.fill_defaults();
    assert!(config.serialize.is_none());
    assert!(config.user_metadata.is_none());
    assert_eq!(config.qos, QosPolicy::default());

    let mut sub_config = SubscriptionConfig {
        qos: QosPolicy::RELIABLE,
        ..SubscriptionConfig::default()
    };
    sub_config.fill_defaults();
    assert_eq!(sub_config.qos.reliability, Reliability::BestEffort);
    assert!(sub_config.deserialize.is_none());
}

#[test]
fn test_publish_without_serializer_forwards_caller_bytes() {
    let mut buf = [0u8; 8];
    let message = 0xdead_beef_u32.to_le_bytes();

    let mut client = ready();
    let node = client.node_create("talker", "").unwrap();
    let publisher = client.publisher_create(node, &U32, 2, &mut buf, None).unwrap();

    client.publish(publisher, &message).unwrap();
    assert_eq!(
        client.middleware().last_publish,
        Some((message.as_ptr() as usize, message.len()))
    );
    assert_eq!(client.middleware().published, vec![message.to_vec()]);
}

#[test]
fn test_publish_with_serializer_sends_wire_bytes() {
    let mut buf = [0u8; 4];
    let message = 1u32.to_le_bytes();
    let config = PublisherConfig {
        serialize: Some(common::swap_u32),
        ..PublisherConfig::default()
    };

    let mut client = ready();
    let node = client.node_create("talker", "").unwrap();
    let publisher = client
        .publisher_create(node, &SWAPPED_U32, 1, &mut buf, Some(&config))
        .unwrap();

    client.publish(publisher, &message).unwrap();
    let (ptr, len) = client.middleware().last_publish.unwrap();
    assert_ne!(ptr, message.as_ptr() as usize);
    assert_eq!(len, 4);
    assert_eq!(client.middleware().published[0], 0x0100_0000_u32.to_le_bytes());
}

#[test]
fn test_descriptor_serializer_is_opt_in() {
    let mut a = [0u8; 4];
    let mut b = [0u8; 4];
    let message = 1u32.to_le_bytes();
    let config = PublisherConfig {
        serialize: Some(SWAPPED_U32.serializer()),
        ..PublisherConfig::default()
    };

    let mut client = ready();
    let node = client.node_create("talker", "").unwrap();
    let raw = client.publisher_create(node, &SWAPPED_U32, 1, &mut a, None).unwrap();
    let encoded = client
        .publisher_create(node, &SWAPPED_U32, 1, &mut b, Some(&config))
        .unwrap();

    client.publish(raw, &message).unwrap();
    client.publish(encoded, &message).unwrap();
    assert_eq!(
        client.middleware().published,
        vec![message.to_vec(), 0x0100_0000_u32.to_le_bytes().to_vec()]
    );
}

#[test]
fn test_publish_failures_reach_exception_callback() {
    let mut buf = [0u8; 4];
    let failures = RefCell::new(Vec::new());
    let on_error = |handle: PublisherHandle, error: Error| failures.borrow_mut().push((handle, error));
    let config = PublisherConfig {
        serialize: Some(common::refuse),
        exception_callback: Some(&on_error),
        ..PublisherConfig::default()
    };

    let mut client = ready();
    let node = client.node_create("talker", "").unwrap();
    let publisher = client.publisher_create(node, &BROKEN, 1, &mut buf, Some(&config)).unwrap();

    assert_eq!(client.publish(publisher, &[1, 2, 3, 4]), Err(Error::Generic));
    assert_eq!(client.middleware().calls.publish, 0);
    assert_eq!(*failures.borrow(), vec![(publisher, Error::Generic)]);
}

#[test]
fn test_middleware_publish_error_is_returned_unchanged() {
    let mut buf = [0u8; 4];
    let failures = RefCell::new(Vec::new());
    let on_error = |_: PublisherHandle, error: Error| failures.borrow_mut().push(error);
    let config = PublisherConfig {
        exception_callback: Some(&on_error),
        ..PublisherConfig::default()
    };

    let mut client = ready();
    let node = client.node_create("talker", "").unwrap();
    let publisher = client.publisher_create(node, &U32, 1, &mut buf, Some(&config)).unwrap();
    client.middleware_mut().fail_publish = Some(Error::Timeout);

    assert_eq!(client.publish(publisher, &[0; 4]), Err(Error::Timeout));
    client.publish(publisher, &[0; 4]).unwrap();
    assert_eq!(*failures.borrow(), vec![Error::Timeout]);
}

#[test]
fn test_publish_argument_checks() {
    let mut buf = [0u8; 4];
    let mut client = ready();
    let node = client.node_create("talker", "").unwrap();
    let publisher = client.publisher_create(node, &U32, 1, &mut buf, None).unwrap();

    assert_eq!(client.publish(PublisherHandle::null(), &[1]), Err(Error::NullPointer));
    assert_eq!(client.publish(publisher, &[]), Err(Error::InvalidParameter));
    let huge = vec![0u8; hdds_micro_rcl::MAX_MESSAGE_SIZE + 1];
    assert_eq!(client.publish(publisher, &huge), Err(Error::InvalidParameter));
    assert_eq!(client.middleware().calls.publish, 0);

    client.publisher_destroy(publisher).unwrap();
    assert_eq!(client.publish(publisher, &[1]), Err(Error::AlreadyDone));
}

#[test]
fn test_publisher_capacity_is_per_node() {
    let mut bufs = [[0u8; 4]; 5];
    let [b0, b1, b2, b3, b4] = &mut bufs;

    let mut client = ready();
    let first = client.node_create("first", "").unwrap();
    let second = client.node_create("second", "").unwrap();

    client.publisher_create(first, &U32, 1, b0, None).unwrap();
    client.publisher_create(first, &U32, 1, b1, None).unwrap();
    assert_eq!(client.publisher_create(first, &U32, 1, b2, None), Err(Error::OutOfSpace));

    client.publisher_create(second, &U32, 1, b3, None).unwrap();
    client.publisher_create(second, &U32, 1, b4, None).unwrap();
    assert_eq!(client.publisher_count(first), Ok(2));
    assert_eq!(client.publisher_count(second), Ok(2));
}

#[test]
fn test_publisher_rollback_and_destroy_retry() {
    let mut a = [0u8; 4];
    let mut b = [0u8; 4];
    let mut client = ready();
    let node = client.node_create("talker", "").unwrap();

    client.middleware_mut().fail_publisher_create = Some(Error::OutOfSpace);
    assert_eq!(client.publisher_create(node, &U32, 1, &mut a, None), Err(Error::OutOfSpace));
    assert_eq!(client.publisher_count(node), Ok(0));

    let publisher = client.publisher_create(node, &U32, 1, &mut b, None).unwrap();
    assert_eq!(publisher.slot_index(), 0);

    client.middleware_mut().fail_publisher_destroy = Some(Error::Timeout);
    assert_eq!(client.publisher_destroy(publisher), Err(Error::Timeout));
    assert_eq!(client.publisher_count(node), Ok(1));
    client.publisher_destroy(publisher).unwrap();
    assert_eq!(client.publisher_destroy(publisher), Err(Error::AlreadyDone));
    assert_eq!(client.publisher_destroy(PublisherHandle::null()), Err(Error::NullPointer));
}

#[test]
fn test_user_metadata_is_returned_by_reference() {
    let mut pub_buf = [0u8; 4];
    let mut sub_buf = [0u8; 4];
    let pub_meta = String::from("pub");
    let sub_meta = 42u32;
    let pub_config = PublisherConfig {
        user_metadata: Some(&pub_meta),
        ..PublisherConfig::default()
    };
    let sub_config = SubscriptionConfig {
        user_metadata: Some(&sub_meta),
        ..SubscriptionConfig::default()
    };

    let mut client = ready();
    let node = client.node_create("meta", "").unwrap();
    let publisher = client.publisher_create(node, &U32, 1, &mut pub_buf, Some(&pub_config)).unwrap();
    let subscription = client
        .subscription_create(node, &U32, "t", &ignore, 1, &mut sub_buf, Some(&sub_config))
        .unwrap();

    let got = client.publisher_user_metadata(publisher).unwrap();
    assert!(std::ptr::eq(got.downcast_ref::<String>().unwrap(), &pub_meta));
    let got = client.subscription_user_metadata(subscription).unwrap();
    assert_eq!(got.downcast_ref::<u32>(), Some(&42));
    assert!(client.subscription_user_metadata(SubscriptionHandle::null()).is_none());
}

#[test]
fn test_subscription_create_validation() {
    let mut bufs = [[0u8; 8]; 4];
    let [b0, b1, b2, b3] = &mut bufs;
    let long = "t".repeat(MAX_TOPIC_NAME_LEN + 1);
    let mut client = ready();
    let node = client.node_create("listener", "").unwrap();

    assert_eq!(
        client.subscription_create(NodeHandle::null(), &U32, "t", &ignore, 1, b0, None),
        Err(Error::NullPointer)
    );
    assert_eq!(
        client.subscription_create(node, &U32, "", &ignore, 1, b1, None),
        Err(Error::InvalidParameter)
    );
    assert_eq!(
        client.subscription_create(node, &U32, &long, &ignore, 1, b2, None),
        Err(Error::InvalidParameter)
    );
    assert_eq!(
        client.subscription_create(node, &U32, "t", &ignore, 3, b3, None),
        Err(Error::InvalidParameter)
    );
    assert_eq!(client.middleware().calls.subscription_create, 0);
}

#[cfg(not(any(feature = "deserialize-static", feature = "deserialize-stack")))]
#[test]
fn test_deserializer_rejected_when_disabled() {
    let mut buf = [0u8; 4];
    let config = SubscriptionConfig {
        deserialize: Some(common::copy),
        ..SubscriptionConfig::default()
    };
    let mut client = ready();
    let node = client.node_create("listener", "").unwrap();

    assert_eq!(
        client.subscription_create(node, &U32, "t", &ignore, 1, &mut buf, Some(&config)),
        Err(Error::InvalidParameter)
    );
}

#[test]
fn test_subscription_slot_reuse_with_two_slots() {
    let mut bufs = [[0u8; 4]; 4];
    let [b0, b1, b2, b3] = &mut bufs;

    let mut client = ready();
    let node = client.node_create("listener", "").unwrap();

    let first = client.subscription_create(node, &U32, "a", &ignore, 1, b0, None).unwrap();
    let second = client.subscription_create(node, &U32, "b", &ignore, 1, b1, None).unwrap();
    assert_eq!((first.slot_index(), second.slot_index()), (0, 1));
    assert_eq!(
        client.subscription_create(node, &U32, "c", &ignore, 1, b2, None),
        Err(Error::OutOfSpace)
    );

    client.subscription_destroy(first).unwrap();
    let third = client.subscription_create(node, &U32, "c", &ignore, 1, b3, None).unwrap();
    assert_eq!(third.slot_index(), 0);
    assert_eq!(client.subscription_topic_name(third), Some("c"));
    assert_eq!(client.subscription_destroy(first), Err(Error::AlreadyDone));
    assert_eq!(client.subscription_count(node), Ok(2));
}

#[test]
fn test_subscription_create_failure_rolls_back() {
    let mut a = [0u8; 4];
    let mut b = [0u8; 4];
    let mut client = ready();
    let node = client.node_create("listener", "").unwrap();

    client.middleware_mut().fail_subscription_create = Some(Error::Generic);
    assert_eq!(
        client.subscription_create(node, &U32, "t", &ignore, 1, &mut a, None),
        Err(Error::Generic)
    );
    assert_eq!(client.subscription_count(node), Ok(0));

    let subscription = client.subscription_create(node, &U32, "t", &ignore, 1, &mut b, None).unwrap();
    assert_eq!(subscription.slot_index(), 0);
    assert_eq!(client.subscription_qos(subscription), Some(QosPolicy::BEST_EFFORT));
}
