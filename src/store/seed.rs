//! Seeded tenant messages.
//!
//! Fixed set the service starts with, so the worklist and dispatch flow are
//! exercisable before any external system is reachable.

use crate::triage::types::{Message, MessageStatus, Priority, Tenant};

/// The locally-seeded message list.
pub fn seed_messages() -> Vec<Message> {
    vec![
        Message {
            id: "1".into(),
            tenant: Tenant::named("Sophie Chen"),
            property: "Sunset Apartments, #302".into(),
            category: "Maintenance".into(),
            body: "The kitchen sink is clogged and water won't drain properly. \
                   I've tried using drain cleaner but it didn't help. Can someone \
                   come take a look?"
                .into(),
            timestamp: "10 minutes ago".into(),
            status: MessageStatus::New,
            priority: Priority::Medium,
        },
        Message {
            id: "2".into(),
            tenant: Tenant {
                avatar: Some("https://i.pravatar.cc/150?img=2".into()),
                ..Tenant::named("James Wilson")
            },
            property: "Riverside Complex, #201".into(),
            category: "Noise Complaint".into(),
            body: "The upstairs neighbors are having a loud party after 11 PM \
                   again. This is the third time this week and I have to work \
                   early in the morning."
                .into(),
            timestamp: "2 hours ago".into(),
            status: MessageStatus::AutoReplied,
            priority: Priority::High,
        },
        Message {
            id: "3".into(),
            tenant: Tenant {
                avatar: Some("https://i.pravatar.cc/150?img=3".into()),
                ..Tenant::named("Maria Rodriguez")
            },
            property: "Park View Residences, #105".into(),
            category: "Rent".into(),
            body: "I'll be making my rent payment by the end of this week. I got \
                   paid late this month but wanted to let you know in advance."
                .into(),
            timestamp: "5 hours ago".into(),
            status: MessageStatus::NeedsReview,
            priority: Priority::Low,
        },
        Message {
            id: "4".into(),
            tenant: Tenant::named("Thomas Baker"),
            property: "Woodland Heights, #417".into(),
            category: "Maintenance".into(),
            body: "The heating system doesn't seem to be working properly. The \
                   apartment gets very cold at night despite setting the \
                   thermostat to 72°F."
                .into(),
            timestamp: "1 day ago".into(),
            status: MessageStatus::Done,
            priority: Priority::Medium,
        },
        Message {
            id: "5".into(),
            tenant: Tenant {
                avatar: Some("https://i.pravatar.cc/150?img=5".into()),
                ..Tenant::named("Aisha Johnson")
            },
            property: "Metro Lofts, #506".into(),
            category: "General".into(),
            body: "I'm planning to renew my lease that expires next month. Could \
                   you send me the new contract when it's ready?"
                .into(),
            timestamp: "1 day ago".into(),
            status: MessageStatus::New,
            priority: Priority::Low,
        },
        Message {
            id: "6".into(),
            tenant: Tenant {
                avatar: Some("https://i.pravatar.cc/150?img=7".into()),
                ..Tenant::named("David Kim")
            },
            property: "Lakeside Villas, #203".into(),
            category: "Maintenance".into(),
            body: "There's a water leak coming from the ceiling in the bathroom. \
                   It's dripping slowly but continuously."
                .into(),
            timestamp: "2 days ago".into(),
            status: MessageStatus::NeedsReview,
            priority: Priority::High,
        },
    ]
}
