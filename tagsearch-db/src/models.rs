use diesel::prelude::*;

#[derive(Debug, Clone, Queryable, Insertable)]
#[diesel(table_name = crate::schema::posted_articles)]
pub struct Article {
    pub id: String,
    pub post_date: String,
    pub update_date: String,
}

#[derive(Debug, Clone, Queryable, Insertable)]
#[diesel(table_name = crate::schema::tags)]
pub struct Tag {
    pub id: String,
    pub org_name: String,
    pub norm_name: String,
}

#[derive(Debug, Clone, Queryable, Insertable)]
#[diesel(table_name = crate::schema::posted_articles_tags)]
pub struct ArticleTag {
    pub article_id: String,
    pub tag_id: String,
}

#[derive(Debug, Clone, Queryable, Insertable)]
#[diesel(table_name = crate::schema::tag_search_caches)]
pub struct TagSearchCache {
    pub id: String,
    pub expiration_time: String,
}

#[derive(Debug, Clone, Queryable, Insertable)]
#[diesel(table_name = crate::schema::tag_search_caches_tags)]
pub struct TagSearchCacheTag {
    pub cache_id: String,
    pub tag_id: String,
}

/// Result row for the raw, lowered id-query (the outer
/// `SELECT posted_articles.id ...`).
#[derive(Debug, Clone, QueryableByName)]
pub struct ArticleIdRow {
    #[diesel(sql_type = diesel::sql_types::Text)]
    pub id: String,
}
