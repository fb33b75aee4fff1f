//! 工作流演示程序
//!
//! 使用内存存储演示病例建档、派工、推进、暂停/恢复、结案以及部门看板

use chrono::{Duration, Utc};
use dentlab_core::{
    Arch, CaseAttributes, CaseCategory, CasePriority, Department, ImpressionType, NewCase,
    NewCaseNote, NewStaff, StaffRole, StaffStatus,
};
use dentlab_database::MemoryStore;
use dentlab_workflow::LabService;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 初始化日志
    tracing_subscriber::fmt::init();

    let service = LabService::with_store(Arc::new(MemoryStore::new()));

    println!("🦷 技工所工作流演示\n");

    // 1. 员工名册
    setup_staff(&service).await?;
    println!("✅ 员工名册设置完成");

    // 2. 各类别病例建档
    let crown = service
        .create_case(NewCase {
            case_id: None,
            doctor: "Dr. Haddad".to_string(),
            patient: "Samir K.".to_string(),
            category: CaseCategory::Fixed,
            attributes: CaseAttributes {
                restoration_type: Some("crown".to_string()),
                material: Some("zirconia".to_string()),
                impression_type: Some(ImpressionType::DigitalScan),
                shade: Some("A2".to_string()),
                teeth: vec![14, 15, 16],
                ..Default::default()
            },
            priority: CasePriority::Rush,
            due_date: Some((Utc::now() + Duration::days(3)).date_naive()),
            instructions: Some("Check occlusion on 16".to_string()),
        })
        .await?;

    let denture = service
        .create_case(NewCase {
            case_id: None,
            doctor: "Dr. Nasser".to_string(),
            patient: "Mona A.".to_string(),
            category: CaseCategory::Removable,
            attributes: CaseAttributes {
                restoration_type: Some("complete denture".to_string()),
                arch: Some(Arch::Upper),
                ..Default::default()
            },
            priority: CasePriority::Normal,
            due_date: Some((Utc::now() + Duration::days(10)).date_naive()),
            instructions: None,
        })
        .await?;

    let aligner = service
        .create_case(NewCase {
            case_id: None,
            doctor: "Dr. Saleh".to_string(),
            patient: "Yousef T.".to_string(),
            category: CaseCategory::Orthodontics,
            attributes: CaseAttributes {
                appliance_type: Some("retainer".to_string()),
                arch: Some(Arch::Both),
                ..Default::default()
            },
            priority: CasePriority::Emergency,
            due_date: None,
            instructions: None,
        })
        .await?;

    for case in [&crown, &denture, &aligner] {
        let route: Vec<&str> = case.workflow.iter().map(|s| s.department.label()).collect();
        println!("📋 {} ({}): {}", case.case_id, case.category.as_str(), route.join(" → "));
    }

    // 3. 派工并推进固定修复病例
    let receptionist = service
        .assignable_staff(Department::Reception)
        .await?
        .into_iter()
        .next()
        .ok_or("no receptionist available")?;
    let result = service
        .assign_staff(&crown.case_id, Department::Reception, &receptionist.staff.staff_id)
        .await?;
    println!("\n👤 派工: {:?}", result.transition);

    for _ in 0..3 {
        let result = service.advance_case(&crown.case_id).await?;
        println!("➡️  推进: {:?}", result.transition);
    }

    // 4. 暂停与恢复
    let result = service
        .pause_case(
            &denture.case_id,
            Some("Waiting for bite registration".to_string()),
            Some("Dr. Nasser".to_string()),
        )
        .await?;
    println!("\n⏸️  暂停: {:?}", result.transition);

    let blocked = service.advance_case(&denture.case_id).await?;
    println!("🚫 暂停期间推进: {:?}", blocked.transition);

    let result = service.resume_case(&denture.case_id, None).await?;
    println!("▶️  恢复: {:?}", result.transition);

    service
        .add_note(
            &denture.case_id,
            NewCaseNote {
                author: "Reception".to_string(),
                content: "Bite registration received".to_string(),
            },
        )
        .await?;

    // 5. 正畸病例走完全部流程并结案
    let steps = aligner.workflow.len();
    for _ in 1..steps {
        service.advance_case(&aligner.case_id).await?;
    }
    let result = service.complete_case(&aligner.case_id).await?;
    println!(
        "\n🏁 结案: {:?} (状态: {})",
        result.transition,
        result.case.status.as_str()
    );

    // 6. 部门看板
    for department in [Department::Reception, Department::CadDesign, Department::ModelRoom] {
        let board = service.department_board(department).await?;
        println!("\n🗂️  {} 看板:", board.department.label);
        println!("   待处理: {}", board.stats.total_items);
        println!("   未派工: {}", board.stats.unassigned_items);
        println!("   已暂停: {}", board.stats.paused_items);
        for item in &board.items {
            println!(
                "   - {} {} / {} [{}]",
                item.case_id,
                item.doctor,
                item.patient,
                item.priority.as_str()
            );
        }
    }

    // 7. 全所概况
    let overview = service.overview().await?;
    println!("\n📊 全所概况:");
    println!("{}", serde_json::to_string_pretty(&overview)?);

    println!("\n🎉 演示完成!");
    Ok(())
}

async fn setup_staff(service: &LabService) -> Result<(), Box<dyn std::error::Error>> {
    let roster = [
        ("Huda", Department::Reception, StaffRole::Receptionist, StaffStatus::Active),
        ("Omar", Department::ModelRoom, StaffRole::Technician, StaffStatus::Active),
        ("Dana", Department::CadDesign, StaffRole::SeniorTechnician, StaffStatus::Busy),
        ("Rami", Department::Milling, StaffRole::Technician, StaffStatus::Offline),
        ("Lina", Department::QualityControl, StaffRole::Supervisor, StaffStatus::Active),
    ];

    for (name, department, role, status) in roster {
        service
            .create_staff(NewStaff {
                staff_id: None,
                name: name.to_string(),
                department,
                role,
                status,
                phone: None,
                email: None,
            })
            .await?;
    }

    Ok(())
}
