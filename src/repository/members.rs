//! Member domain methods on Repository

use super::Repository;
use crate::{
    error::AppResult,
    models::{member::MemberRow, Member},
};

impl Repository {
    /// Insert a member row under an explicit identifier
    pub(crate) async fn members_insert(&self, id: i64, member: &Member) -> AppResult<()> {
        sqlx::query("INSERT INTO members (id, name, address, borrowed_book_id) VALUES (?, ?, ?, ?)")
            .bind(id)
            .bind(member.name())
            .bind(member.address())
            .bind(member.borrowed_book_id())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub(crate) async fn members_update_borrow(&self, member_id: i64, borrowed_book_id: i64) -> AppResult<()> {
        let result = sqlx::query("UPDATE members SET borrowed_book_id = ? WHERE id = ?")
            .bind(borrowed_book_id)
            .bind(member_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound.into());
        }
        Ok(())
    }

    pub(crate) async fn members_delete(&self, id: i64) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM members WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound.into());
        }
        Ok(())
    }

    pub(crate) async fn members_load_all(&self) -> AppResult<Vec<Member>> {
        let rows = sqlx::query_as::<_, MemberRow>(
            "SELECT id, name, address, borrowed_book_id FROM members ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Member::from).collect())
    }
}
