// Diesel table definitions.
// Kept in sync by hand with the bootstrap SQL in repository/context.rs.

diesel::table! {
    jobs (id) {
        id -> Integer,
        title -> Text,
        company -> Text,
        url -> Text,
        source -> Text,
        category -> Text,
        location -> Text,
        salary -> Nullable<Text>,
        posted_at -> Nullable<Text>,
        created_at -> Text,
        hash -> Text,
    }
}

diesel::table! {
    meta (key) {
        key -> Text,
        value -> Text,
    }
}

diesel::allow_tables_to_appear_in_same_query!(jobs, meta);
