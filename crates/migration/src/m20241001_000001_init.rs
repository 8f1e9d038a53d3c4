//! Initial schema.
//!
//! - `users`: merchants issuing checks, with their printer width
//! - `checks`: issued receipts with precomputed total and change
//! - `check_products`: line items of a check
//! - `check_payments`: the single payment of a check
//!
//! Money columns hold exact decimal text. `checks.total_minor` keeps the
//! total in cents so range filters can run in SQL.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Users {
    Table,
    Id,
    Username,
    Password,
    FirstName,
    LastName,
    Email,
    PhoneNumber,
    CheckSymbols,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Checks {
    Table,
    Id,
    UserId,
    Comment,
    Total,
    TotalMinor,
    Rest,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum CheckProducts {
    Table,
    Id,
    CheckId,
    Name,
    Price,
    Quantity,
    Total,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum CheckPayments {
    Table,
    Id,
    CheckId,
    #[iden = "type"]
    Kind,
    Amount,
    CreatedAt,
    UpdatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Users::Username)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Users::Password).string().not_null())
                    .col(ColumnDef::new(Users::FirstName).string())
                    .col(ColumnDef::new(Users::LastName).string())
                    .col(ColumnDef::new(Users::Email).string())
                    .col(ColumnDef::new(Users::PhoneNumber).string())
                    .col(ColumnDef::new(Users::CheckSymbols).integer())
                    .col(
                        ColumnDef::new(Users::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Users::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Checks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Checks::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Checks::UserId).big_integer().not_null())
                    .col(ColumnDef::new(Checks::Comment).text())
                    .col(ColumnDef::new(Checks::Total).string().not_null())
                    .col(ColumnDef::new(Checks::TotalMinor).big_integer().not_null())
                    .col(ColumnDef::new(Checks::Rest).string().not_null())
                    .col(
                        ColumnDef::new(Checks::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Checks::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-checks-user_id")
                            .from(Checks::Table, Checks::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-checks-user_id-created_at")
                    .table(Checks::Table)
                    .col(Checks::UserId)
                    .col(Checks::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CheckProducts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CheckProducts::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(CheckProducts::CheckId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(CheckProducts::Name).string().not_null())
                    .col(ColumnDef::new(CheckProducts::Price).string().not_null())
                    .col(ColumnDef::new(CheckProducts::Quantity).string().not_null())
                    .col(ColumnDef::new(CheckProducts::Total).string().not_null())
                    .col(
                        ColumnDef::new(CheckProducts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CheckProducts::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-check_products-check_id")
                            .from(CheckProducts::Table, CheckProducts::CheckId)
                            .to(Checks::Table, Checks::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-check_products-check_id")
                    .table(CheckProducts::Table)
                    .col(CheckProducts::CheckId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CheckPayments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CheckPayments::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(CheckPayments::CheckId)
                            .big_integer()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(CheckPayments::Kind).string().not_null())
                    .col(ColumnDef::new(CheckPayments::Amount).string().not_null())
                    .col(
                        ColumnDef::new(CheckPayments::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CheckPayments::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-check_payments-check_id")
                            .from(CheckPayments::Table, CheckPayments::CheckId)
                            .to(Checks::Table, Checks::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CheckPayments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CheckProducts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Checks::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}
