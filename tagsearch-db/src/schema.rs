// @generated-by-hand to mirror what `diesel print-schema` would emit for
// the migration in `migrations/2024-01-01-000000_init`.

diesel::table! {
    posted_articles (id) {
        id -> Text,
        post_date -> Text,
        update_date -> Text,
    }
}

diesel::table! {
    tags (id) {
        id -> Text,
        org_name -> Text,
        norm_name -> Text,
    }
}

diesel::table! {
    posted_articles_tags (article_id, tag_id) {
        article_id -> Text,
        tag_id -> Text,
    }
}

diesel::table! {
    tag_search_caches (id) {
        id -> Text,
        expiration_time -> Text,
    }
}

diesel::table! {
    tag_search_caches_tags (cache_id, tag_id) {
        cache_id -> Text,
        tag_id -> Text,
    }
}

diesel::joinable!(posted_articles_tags -> posted_articles (article_id));
diesel::joinable!(posted_articles_tags -> tags (tag_id));
diesel::joinable!(tag_search_caches_tags -> tag_search_caches (cache_id));
diesel::joinable!(tag_search_caches_tags -> tags (tag_id));

diesel::allow_tables_to_appear_in_same_query!(
    posted_articles,
    tags,
    posted_articles_tags,
    tag_search_caches,
    tag_search_caches_tags,
);
