use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260201_000001_create_gift_cards_table::Migration),
            Box::new(m20260201_000002_create_coupons_table::Migration),
            Box::new(m20260201_000003_create_redemptions_table::Migration),
        ]
    }
}

// Migration implementations

mod m20260201_000001_create_gift_cards_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20260201_000001_create_gift_cards_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(GiftCards::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(GiftCards::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(GiftCards::Code).string().not_null())
                        .col(ColumnDef::new(GiftCards::Status).string().not_null())
                        .col(
                            ColumnDef::new(GiftCards::OriginalAmount)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(GiftCards::RemainingAmount)
                                .big_integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(GiftCards::ExpiresAt).timestamp().null())
                        .col(ColumnDef::new(GiftCards::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(GiftCards::UpdatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await?;

            // The code is the lookup key and must be unique across cards.
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_gift_cards_code")
                        .table(GiftCards::Table)
                        .col(GiftCards::Code)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(GiftCards::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum GiftCards {
        Table,
        Id,
        Code,
        Status,
        OriginalAmount,
        RemainingAmount,
        ExpiresAt,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20260201_000002_create_coupons_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20260201_000002_create_coupons_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Coupons::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Coupons::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Coupons::Code).string().not_null())
                        .col(
                            ColumnDef::new(Coupons::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(ColumnDef::new(Coupons::StartsAt).timestamp().null())
                        .col(ColumnDef::new(Coupons::EndsAt).timestamp().null())
                        .col(ColumnDef::new(Coupons::DiscountType).string().not_null())
                        .col(ColumnDef::new(Coupons::DiscountValue).decimal().not_null())
                        .col(
                            ColumnDef::new(Coupons::MaxDiscountAmount)
                                .big_integer()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Coupons::MinOrderAmount)
                                .big_integer()
                                .null(),
                        )
                        .col(ColumnDef::new(Coupons::UsageLimitTotal).integer().null())
                        .col(ColumnDef::new(Coupons::UsageLimitPerUser).integer().null())
                        .col(
                            ColumnDef::new(Coupons::TimesUsed)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Coupons::Conditions).json().null())
                        .col(ColumnDef::new(Coupons::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Coupons::UpdatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_coupons_code")
                        .table(Coupons::Table)
                        .col(Coupons::Code)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Coupons::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Coupons {
        Table,
        Id,
        Code,
        IsActive,
        StartsAt,
        EndsAt,
        DiscountType,
        DiscountValue,
        MaxDiscountAmount,
        MinOrderAmount,
        UsageLimitTotal,
        UsageLimitPerUser,
        TimesUsed,
        Conditions,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20260201_000003_create_redemptions_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20260201_000003_create_redemptions_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Redemptions::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Redemptions::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Redemptions::Code).string().not_null())
                        .col(ColumnDef::new(Redemptions::Kind).string().not_null())
                        .col(ColumnDef::new(Redemptions::OrderId).string().not_null())
                        .col(ColumnDef::new(Redemptions::UserId).uuid().null())
                        .col(ColumnDef::new(Redemptions::UserEmail).string().null())
                        .col(ColumnDef::new(Redemptions::Amount).big_integer().not_null())
                        .col(
                            ColumnDef::new(Redemptions::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            // Idempotency boundary: one redemption per (code, order) pair.
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_redemptions_code_order")
                        .table(Redemptions::Table)
                        .col(Redemptions::Code)
                        .col(Redemptions::OrderId)
                        .unique()
                        .to_owned(),
                )
                .await?;

            // Per-user and first-purchase eligibility counts filter on identity.
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_redemptions_user_id")
                        .table(Redemptions::Table)
                        .col(Redemptions::UserId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_redemptions_user_email")
                        .table(Redemptions::Table)
                        .col(Redemptions::UserEmail)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Redemptions::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Redemptions {
        Table,
        Id,
        Code,
        Kind,
        OrderId,
        UserId,
        UserEmail,
        Amount,
        CreatedAt,
    }
}
