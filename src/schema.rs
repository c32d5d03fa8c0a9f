diesel::table! {
    subscriptions (email) {
        email -> Text,
        min_magnitude -> Float4,
        event_type -> Text,
        sent -> Bool,
    }
}
