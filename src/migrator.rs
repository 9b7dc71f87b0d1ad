use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240301_000001_create_inventory_tables::Migration),
            Box::new(m20240301_000002_create_sales_tables::Migration),
            Box::new(m20240301_000003_create_discount_tables::Migration),
            Box::new(m20240301_000004_create_credit_tables::Migration),
        ]
    }
}

// Migration implementations

mod m20240301_000001_create_inventory_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000001_create_inventory_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ProductVariants::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ProductVariants::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ProductVariants::ProductId).uuid().not_null())
                        .col(
                            ColumnDef::new(ProductVariants::Sku)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(ProductVariants::Name).string().not_null())
                        .col(
                            ColumnDef::new(ProductVariants::SalePrice)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(ProductVariants::Cost)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(ProductVariants::StockQuantity)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(ProductVariants::MinStock)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(ProductVariants::MaxStock).integer().null())
                        .col(
                            ColumnDef::new(ProductVariants::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(ProductVariants::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductVariants::UpdatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_product_variants_product_id")
                        .table(ProductVariants::Table)
                        .col(ProductVariants::ProductId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(MovementTypes::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(MovementTypes::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(MovementTypes::Code)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(MovementTypes::Name).string().not_null())
                        .col(
                            ColumnDef::new(MovementTypes::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(InventoryMovements::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(InventoryMovements::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryMovements::VariantId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryMovements::MovementTypeId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryMovements::Quantity)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryMovements::StockBefore)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryMovements::StockAfter)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryMovements::UnitCost)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(InventoryMovements::TotalValue)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(InventoryMovements::SaleId).uuid().null())
                        .col(ColumnDef::new(InventoryMovements::PurchaseId).uuid().null())
                        .col(ColumnDef::new(InventoryMovements::ReturnId).uuid().null())
                        .col(ColumnDef::new(InventoryMovements::Notes).string().null())
                        .col(
                            ColumnDef::new(InventoryMovements::CreatedBy)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryMovements::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_inventory_movements_variant_id")
                        .table(InventoryMovements::Table)
                        .col(InventoryMovements::VariantId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_inventory_movements_sale_id")
                        .table(InventoryMovements::Table)
                        .col(InventoryMovements::SaleId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_inventory_movements_created_at")
                        .table(InventoryMovements::Table)
                        .col(InventoryMovements::CreatedAt)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(InventoryMovements::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(MovementTypes::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(ProductVariants::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum ProductVariants {
        Table,
        Id,
        ProductId,
        Sku,
        Name,
        SalePrice,
        Cost,
        StockQuantity,
        MinStock,
        MaxStock,
        IsActive,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum MovementTypes {
        Table,
        Id,
        Code,
        Name,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum InventoryMovements {
        Table,
        Id,
        VariantId,
        MovementTypeId,
        Quantity,
        StockBefore,
        StockAfter,
        UnitCost,
        TotalValue,
        SaleId,
        PurchaseId,
        ReturnId,
        Notes,
        CreatedBy,
        CreatedAt,
    }
}

mod m20240301_000002_create_sales_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000002_create_sales_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Sales::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Sales::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(Sales::SaleNumber)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Sales::CustomerId).uuid().not_null())
                        .col(ColumnDef::new(Sales::SellerId).uuid().not_null())
                        .col(ColumnDef::new(Sales::Status).string().not_null())
                        .col(
                            ColumnDef::new(Sales::Subtotal)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Sales::Tax).decimal().not_null().default(0))
                        .col(
                            ColumnDef::new(Sales::DiscountTotal)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Sales::Total).decimal().not_null().default(0))
                        .col(
                            ColumnDef::new(Sales::AmountPaid)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Sales::BalanceDue)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Sales::PaymentStatus).string().not_null())
                        .col(ColumnDef::new(Sales::DiscountId).uuid().null())
                        .col(ColumnDef::new(Sales::Notes).string().null())
                        .col(ColumnDef::new(Sales::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Sales::UpdatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_sales_customer_id")
                        .table(Sales::Table)
                        .col(Sales::CustomerId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_sales_payment_status")
                        .table(Sales::Table)
                        .col(Sales::PaymentStatus)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_sales_created_at")
                        .table(Sales::Table)
                        .col(Sales::CreatedAt)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(SaleLines::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(SaleLines::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(SaleLines::SaleId).uuid().not_null())
                        .col(ColumnDef::new(SaleLines::VariantId).uuid().not_null())
                        .col(ColumnDef::new(SaleLines::Quantity).integer().not_null())
                        .col(ColumnDef::new(SaleLines::UnitPrice).decimal().not_null())
                        .col(
                            ColumnDef::new(SaleLines::LineDiscount)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(SaleLines::Subtotal).decimal().not_null())
                        .col(ColumnDef::new(SaleLines::Total).decimal().not_null())
                        .col(ColumnDef::new(SaleLines::CreatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_sale_lines_sale_id")
                        .table(SaleLines::Table)
                        .col(SaleLines::SaleId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(PaymentMethods::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PaymentMethods::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PaymentMethods::Code)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(PaymentMethods::Name).string().not_null())
                        .col(ColumnDef::new(PaymentMethods::Category).string().not_null())
                        .col(
                            ColumnDef::new(PaymentMethods::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(PaymentMethods::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Payments::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Payments::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Payments::SaleId).uuid().not_null())
                        .col(ColumnDef::new(Payments::Amount).decimal().not_null())
                        .col(ColumnDef::new(Payments::PaymentMethodId).uuid().not_null())
                        .col(ColumnDef::new(Payments::BalanceBefore).decimal().not_null())
                        .col(ColumnDef::new(Payments::BalanceAfter).decimal().not_null())
                        .col(ColumnDef::new(Payments::Kind).string().not_null())
                        .col(ColumnDef::new(Payments::Notes).string().null())
                        .col(ColumnDef::new(Payments::ReceivedBy).uuid().not_null())
                        .col(ColumnDef::new(Payments::CreatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_payments_sale_id")
                        .table(Payments::Table)
                        .col(Payments::SaleId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Payments::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(PaymentMethods::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(SaleLines::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Sales::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Sales {
        Table,
        Id,
        SaleNumber,
        CustomerId,
        SellerId,
        Status,
        Subtotal,
        Tax,
        DiscountTotal,
        Total,
        AmountPaid,
        BalanceDue,
        PaymentStatus,
        DiscountId,
        Notes,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum SaleLines {
        Table,
        Id,
        SaleId,
        VariantId,
        Quantity,
        UnitPrice,
        LineDiscount,
        Subtotal,
        Total,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum PaymentMethods {
        Table,
        Id,
        Code,
        Name,
        Category,
        IsActive,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum Payments {
        Table,
        Id,
        SaleId,
        Amount,
        PaymentMethodId,
        BalanceBefore,
        BalanceAfter,
        Kind,
        Notes,
        ReceivedBy,
        CreatedAt,
    }
}

mod m20240301_000003_create_discount_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000003_create_discount_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Discounts::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Discounts::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Discounts::Name).string().not_null())
                        .col(ColumnDef::new(Discounts::Code).string().null().unique_key())
                        .col(ColumnDef::new(Discounts::Scope).string().not_null())
                        .col(ColumnDef::new(Discounts::Kind).string().not_null())
                        .col(ColumnDef::new(Discounts::Value).decimal().not_null())
                        .col(ColumnDef::new(Discounts::StartsAt).timestamp().null())
                        .col(ColumnDef::new(Discounts::EndsAt).timestamp().null())
                        .col(
                            ColumnDef::new(Discounts::MinPurchaseAmount)
                                .decimal()
                                .null(),
                        )
                        .col(ColumnDef::new(Discounts::MaxUses).integer().null())
                        .col(
                            ColumnDef::new(Discounts::MaxUsesPerCustomer)
                                .integer()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Discounts::UsageCount)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Discounts::Status).string().not_null())
                        .col(ColumnDef::new(Discounts::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Discounts::UpdatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_discounts_status")
                        .table(Discounts::Table)
                        .col(Discounts::Status)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(DiscountUsages::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(DiscountUsages::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(DiscountUsages::DiscountId).uuid().not_null())
                        .col(ColumnDef::new(DiscountUsages::CustomerId).uuid().not_null())
                        .col(
                            ColumnDef::new(DiscountUsages::UsageCount)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(DiscountUsages::LastUsedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DiscountUsages::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            // One counter row per discount and customer
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_discount_usages_discount_customer")
                        .table(DiscountUsages::Table)
                        .col(DiscountUsages::DiscountId)
                        .col(DiscountUsages::CustomerId)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(DiscountHistory::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(DiscountHistory::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(DiscountHistory::DiscountId).uuid().not_null())
                        .col(ColumnDef::new(DiscountHistory::SaleId).uuid().not_null())
                        .col(ColumnDef::new(DiscountHistory::CustomerId).uuid().not_null())
                        .col(
                            ColumnDef::new(DiscountHistory::AppliedValue)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DiscountHistory::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_discount_history_discount_id")
                        .table(DiscountHistory::Table)
                        .col(DiscountHistory::DiscountId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_discount_history_sale_id")
                        .table(DiscountHistory::Table)
                        .col(DiscountHistory::SaleId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(DiscountHistory::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(DiscountUsages::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Discounts::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Discounts {
        Table,
        Id,
        Name,
        Code,
        Scope,
        Kind,
        Value,
        StartsAt,
        EndsAt,
        MinPurchaseAmount,
        MaxUses,
        MaxUsesPerCustomer,
        UsageCount,
        Status,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum DiscountUsages {
        Table,
        Id,
        DiscountId,
        CustomerId,
        UsageCount,
        LastUsedAt,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum DiscountHistory {
        Table,
        Id,
        DiscountId,
        SaleId,
        CustomerId,
        AppliedValue,
        CreatedAt,
    }
}

mod m20240301_000004_create_credit_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000004_create_credit_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Credits::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Credits::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(Credits::SaleId)
                                .uuid()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Credits::CustomerId).uuid().not_null())
                        .col(ColumnDef::new(Credits::Principal).decimal().not_null())
                        .col(
                            ColumnDef::new(Credits::Repaid)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Credits::Balance).decimal().not_null())
                        .col(ColumnDef::new(Credits::Status).string().not_null())
                        .col(ColumnDef::new(Credits::OpenedAt).timestamp().not_null())
                        .col(ColumnDef::new(Credits::DueDate).timestamp().not_null())
                        .col(ColumnDef::new(Credits::LastPaymentAt).timestamp().null())
                        .col(ColumnDef::new(Credits::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Credits::UpdatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_credits_customer_id")
                        .table(Credits::Table)
                        .col(Credits::CustomerId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_credits_status")
                        .table(Credits::Table)
                        .col(Credits::Status)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(CustomerCreditSummaries::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(CustomerCreditSummaries::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(CustomerCreditSummaries::CustomerId)
                                .uuid()
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(CustomerCreditSummaries::TotalExtended)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(CustomerCreditSummaries::TotalOutstanding)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(CustomerCreditSummaries::TotalRepaid)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(CustomerCreditSummaries::ActiveCredits)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(CustomerCreditSummaries::PaidCredits)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(CustomerCreditSummaries::LastCreditAt)
                                .timestamp()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(CustomerCreditSummaries::LastPaymentAt)
                                .timestamp()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(CustomerCreditSummaries::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(CustomerCreditSummaries::UpdatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(
                    Table::drop()
                        .table(CustomerCreditSummaries::Table)
                        .to_owned(),
                )
                .await?;
            manager
                .drop_table(Table::drop().table(Credits::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Credits {
        Table,
        Id,
        SaleId,
        CustomerId,
        Principal,
        Repaid,
        Balance,
        Status,
        OpenedAt,
        DueDate,
        LastPaymentAt,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum CustomerCreditSummaries {
        Table,
        Id,
        CustomerId,
        TotalExtended,
        TotalOutstanding,
        TotalRepaid,
        ActiveCredits,
        PaidCredits,
        LastCreditAt,
        LastPaymentAt,
        CreatedAt,
        UpdatedAt,
    }
}
