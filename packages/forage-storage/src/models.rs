use time::OffsetDateTime;

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct Post {
	pub id: i64,
	pub topic_id: i64,
	pub user_id: Option<i64>,
	pub post_number: i32,
	pub raw: String,
	pub cooked: String,
	pub created_at: OffsetDateTime,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct Topic {
	pub id: i64,
	pub title: String,
	pub category_id: Option<i64>,
	pub closed: bool,
	pub archived: bool,
	pub visible: bool,
	pub posts_count: i32,
	pub participant_count: i32,
	pub created_at: OffsetDateTime,
}
