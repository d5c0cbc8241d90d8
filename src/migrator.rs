//! Embedded sea-orm migrator. One inline migration module per table group,
//! executed on startup when `auto_migrate` is enabled.

use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240201_000001_create_reference_tables::Migration),
            Box::new(m20240201_000002_create_order_distribution_tables::Migration),
            Box::new(m20240201_000003_create_schedule_tables::Migration),
        ]
    }
}

// Migration implementations

mod m20240201_000001_create_reference_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240201_000001_create_reference_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Customers::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Customers::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Customers::Name).string().not_null())
                        .col(ColumnDef::new(Customers::Code).string().not_null())
                        .col(ColumnDef::new(Customers::CreatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Orders::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Orders::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Orders::OrderNumber).string().not_null())
                        .col(ColumnDef::new(Orders::CustomerId).uuid().not_null())
                        .col(ColumnDef::new(Orders::Status).string().not_null())
                        .col(ColumnDef::new(Orders::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Orders::UpdatedAt).timestamp().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_orders_customer_id")
                        .table(Orders::Table)
                        .col(Orders::CustomerId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_orders_status")
                        .table(Orders::Table)
                        .col(Orders::Status)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Flyers::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Flyers::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Flyers::Name).string().not_null())
                        .col(ColumnDef::new(Flyers::Code).string().not_null())
                        .col(ColumnDef::new(Flyers::Size).string().null())
                        .col(ColumnDef::new(Flyers::CreatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Areas::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Areas::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Areas::AddressCode).string().not_null())
                        .col(ColumnDef::new(Areas::Town).string().not_null())
                        .col(ColumnDef::new(Areas::City).string().not_null())
                        .col(ColumnDef::new(Areas::Prefecture).string().not_null())
                        .col(ColumnDef::new(Areas::DoorToDoorCapacity).integer().null())
                        .col(ColumnDef::new(Areas::MultiFamilyCapacity).integer().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_areas_address_code")
                        .table(Areas::Table)
                        .col(Areas::AddressCode)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Areas::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Flyers::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Orders::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Customers::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Customers {
        Table,
        Id,
        Name,
        Code,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum Orders {
        Table,
        Id,
        OrderNumber,
        CustomerId,
        Status,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum Flyers {
        Table,
        Id,
        Name,
        Code,
        Size,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum Areas {
        Table,
        Id,
        AddressCode,
        Town,
        City,
        Prefecture,
        DoorToDoorCapacity,
        MultiFamilyCapacity,
    }
}

mod m20240201_000002_create_order_distribution_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240201_000002_create_order_distribution_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(OrderDistributions::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(OrderDistributions::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(OrderDistributions::OrderId).uuid().not_null())
                        .col(ColumnDef::new(OrderDistributions::FlyerId).uuid().not_null())
                        .col(ColumnDef::new(OrderDistributions::Method).string().not_null())
                        .col(
                            ColumnDef::new(OrderDistributions::PlannedCount)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(OrderDistributions::StartDate).date().not_null())
                        .col(ColumnDef::new(OrderDistributions::EndDate).date().not_null())
                        .col(ColumnDef::new(OrderDistributions::SpareDate).date().null())
                        .col(
                            ColumnDef::new(OrderDistributions::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(ColumnDef::new(OrderDistributions::UpdatedAt).timestamp().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_order_distributions_order_flyer")
                        .table(OrderDistributions::Table)
                        .col(OrderDistributions::OrderId)
                        .col(OrderDistributions::FlyerId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(OrderDistributionAreas::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(OrderDistributionAreas::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(OrderDistributionAreas::OrderDistributionId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(OrderDistributionAreas::AreaId).uuid().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_oda_distribution_id")
                        .table(OrderDistributionAreas::Table)
                        .col(OrderDistributionAreas::OrderDistributionId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(OrderDistributionAreas::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(OrderDistributions::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum OrderDistributions {
        Table,
        Id,
        OrderId,
        FlyerId,
        Method,
        PlannedCount,
        StartDate,
        EndDate,
        SpareDate,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum OrderDistributionAreas {
        Table,
        Id,
        OrderDistributionId,
        AreaId,
    }
}

mod m20240201_000003_create_schedule_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240201_000003_create_schedule_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Schedules::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Schedules::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Schedules::DeliveryDate).date().not_null())
                        .col(ColumnDef::new(Schedules::BranchId).uuid().null())
                        .col(ColumnDef::new(Schedules::Operator).string().null())
                        .col(ColumnDef::new(Schedules::Status).string().not_null())
                        .col(ColumnDef::new(Schedules::Remarks).string().null())
                        .col(
                            ColumnDef::new(Schedules::SlotCount)
                                .integer()
                                .not_null()
                                .default(10),
                        )
                        .col(ColumnDef::new(Schedules::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Schedules::UpdatedAt).timestamp().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_schedules_delivery_date")
                        .table(Schedules::Table)
                        .col(Schedules::DeliveryDate)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(DistributionItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(DistributionItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(DistributionItems::ScheduleId).uuid().not_null())
                        .col(
                            ColumnDef::new(DistributionItems::SlotIndex)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(DistributionItems::OrderId).uuid().not_null())
                        .col(ColumnDef::new(DistributionItems::FlyerId).uuid().not_null())
                        .col(ColumnDef::new(DistributionItems::CustomerId).uuid().not_null())
                        .col(ColumnDef::new(DistributionItems::AreaId).uuid().not_null())
                        .col(ColumnDef::new(DistributionItems::FlyerName).string().not_null())
                        .col(ColumnDef::new(DistributionItems::FlyerCode).string().not_null())
                        .col(ColumnDef::new(DistributionItems::Method).string().not_null())
                        .col(
                            ColumnDef::new(DistributionItems::PlannedCount)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(DistributionItems::StartDate).date().not_null())
                        .col(ColumnDef::new(DistributionItems::EndDate).date().not_null())
                        .col(ColumnDef::new(DistributionItems::SpareDate).date().null())
                        .col(
                            ColumnDef::new(DistributionItems::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(ColumnDef::new(DistributionItems::UpdatedAt).timestamp().null())
                        .to_owned(),
                )
                .await?;

            // Lookup patterns: per-schedule board reads, per-distribution stats,
            // placed-key probes for the unassigned report.
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_distribution_items_schedule_id")
                        .table(DistributionItems::Table)
                        .col(DistributionItems::ScheduleId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_distribution_items_order_flyer")
                        .table(DistributionItems::Table)
                        .col(DistributionItems::OrderId)
                        .col(DistributionItems::FlyerId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_distribution_items_order_flyer_area")
                        .table(DistributionItems::Table)
                        .col(DistributionItems::OrderId)
                        .col(DistributionItems::FlyerId)
                        .col(DistributionItems::AreaId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(DistributionItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Schedules::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Schedules {
        Table,
        Id,
        DeliveryDate,
        BranchId,
        Operator,
        Status,
        Remarks,
        SlotCount,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum DistributionItems {
        Table,
        Id,
        ScheduleId,
        SlotIndex,
        OrderId,
        FlyerId,
        CustomerId,
        AreaId,
        FlyerName,
        FlyerCode,
        Method,
        PlannedCount,
        StartDate,
        EndDate,
        SpareDate,
        CreatedAt,
        UpdatedAt,
    }
}
