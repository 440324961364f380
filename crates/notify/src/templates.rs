use tera::{Context, Tera};

use moveline_core::domain::booking::Booking;
use moveline_core::domain::session::CallSession;
use moveline_core::pricing::QuoteBreakdown;

const BOOKING_CONFIRMATION_EMAIL: &str = "\
Hi {{ customer_name }},

Your move is booked! Here are the details:

  Reference:  {{ reference }}
  Date:       {{ move_date }}
  Arrival:    {{ arrival_window }}
  Service:    {{ service_label }}
  From:       {{ pickup }}
  To:         {{ delivery }}
  Total:      ${{ total }}

Reply to this email or call us if anything changes.

- The Moveline Team";

const BOOKING_CONFIRMATION_SMS: &str = "\
Moveline: booked! Ref {{ reference }}, {{ move_date }} arrival {{ arrival_window }}. \
Total ${{ total }}.";

const PAYMENT_LINK_SMS: &str = "\
Moveline: secure your {{ move_date }} move with a card on file: \
{{ payment_url }} (ref {{ reference }})";

const QUOTE_EMAIL: &str = "\
Hi,

Thanks for calling Moveline. Your estimate:

  Service:      {{ service_label }}
  Crew:         {{ crew_size }} movers
  Est. hours:   {{ hours }}
  Hourly rate:  ${{ hourly_rate }}
  Subtotal:     ${{ subtotal }}
{% if travel_fee != \"0.00\" %}  Travel fee:   ${{ travel_fee }}
{% endif %}  Service fee:  ${{ service_charge }}
  Total:        ${{ total }}

Call us back any time to put it on the calendar.

- The Moveline Team";

const CANCELLATION_EMAIL: &str = "\
Hi {{ customer_name }},

Your booking {{ reference }} for {{ move_date }} has been cancelled. \
If this wasn't you, call us right away.

- The Moveline Team";

const RESCHEDULE_EMAIL: &str = "\
Hi {{ customer_name }},

Your booking {{ reference }} has moved to {{ move_date }}, \
arrival {{ arrival_window }}.

- The Moveline Team";

const BOOKING_LINK_SMS: &str = "\
Moveline: book your move online here: {{ booking_url }}";

const TRANSCRIPT_EMAIL: &str = "\
Call transcript for {{ call_id }} ({{ caller }})
Started {{ started_at }}, final stage {{ final_stage }}.

{% for turn in turns %}[{{ turn.index }}] {{ turn.stage_before }} -> {{ turn.stage_after }}: {{ turn.input }}
{% endfor %}";

pub struct Templates {
    tera: Tera,
}

impl Templates {
    pub fn new() -> Result<Self, tera::Error> {
        let mut tera = Tera::default();
        tera.add_raw_templates([
            ("booking_confirmation_email", BOOKING_CONFIRMATION_EMAIL),
            ("booking_confirmation_sms", BOOKING_CONFIRMATION_SMS),
            ("payment_link_sms", PAYMENT_LINK_SMS),
            ("quote_email", QUOTE_EMAIL),
            ("cancellation_email", CANCELLATION_EMAIL),
            ("reschedule_email", RESCHEDULE_EMAIL),
            ("booking_link_sms", BOOKING_LINK_SMS),
            ("transcript_email", TRANSCRIPT_EMAIL),
        ])?;
        Ok(Self { tera })
    }

    pub fn booking_confirmation_email(&self, booking: &Booking) -> Result<String, tera::Error> {
        self.tera.render("booking_confirmation_email", &booking_context(booking))
    }

    pub fn booking_confirmation_sms(&self, booking: &Booking) -> Result<String, tera::Error> {
        self.tera.render("booking_confirmation_sms", &booking_context(booking))
    }

    pub fn payment_link_sms(
        &self,
        booking: &Booking,
        payment_url: &str,
    ) -> Result<String, tera::Error> {
        let mut context = booking_context(booking);
        context.insert("payment_url", payment_url);
        self.tera.render("payment_link_sms", &context)
    }

    pub fn quote_email(&self, quote: &QuoteBreakdown) -> Result<String, tera::Error> {
        let mut context = Context::new();
        context.insert("service_label", quote.category.label());
        context.insert("crew_size", &quote.crew_size);
        context.insert("hours", &quote.hours);
        context.insert("hourly_rate", &money(quote.hourly_rate));
        context.insert("subtotal", &money(quote.subtotal));
        context.insert("travel_fee", &money(quote.travel_fee));
        context.insert("service_charge", &money(quote.service_charge));
        context.insert("total", &money(quote.total));
        self.tera.render("quote_email", &context)
    }

    pub fn cancellation_email(&self, booking: &Booking) -> Result<String, tera::Error> {
        self.tera.render("cancellation_email", &booking_context(booking))
    }

    pub fn reschedule_email(&self, booking: &Booking) -> Result<String, tera::Error> {
        self.tera.render("reschedule_email", &booking_context(booking))
    }

    pub fn booking_link_sms(&self, booking_url: &str) -> Result<String, tera::Error> {
        let mut context = Context::new();
        context.insert("booking_url", booking_url);
        self.tera.render("booking_link_sms", &context)
    }

    pub fn transcript_email(&self, session: &CallSession) -> Result<String, tera::Error> {
        let mut context = Context::new();
        context.insert("call_id", &session.call_id.0);
        context.insert("caller", &session.caller_contact);
        context.insert("started_at", &session.started_at.to_rfc3339());
        context.insert("final_stage", session.stage.as_str());

        let turns: Vec<serde_json::Value> = session
            .history
            .iter()
            .map(|record| {
                serde_json::json!({
                    "index": record.turn,
                    "stage_before": record.stage_before.as_str(),
                    "stage_after": record.stage_after.as_str(),
                    "input": record.input,
                })
            })
            .collect();
        context.insert("turns", &turns);

        self.tera.render("transcript_email", &context)
    }
}

fn booking_context(booking: &Booking) -> Context {
    let mut context = Context::new();
    context.insert("customer_name", &booking.customer.name);
    context.insert("reference", &booking.id.0);
    context.insert("move_date", &booking.schedule.date.format("%B %-d, %Y").to_string());
    context.insert("arrival_window", booking.schedule.slot.display_window());
    context.insert("service_label", &booking.service.label);
    context.insert("pickup", &booking.route.pickup);
    context.insert("delivery", &booking.route.delivery);
    context.insert("total", &money(booking.price.total));
    context
}

fn money(value: rust_decimal::Decimal) -> String {
    format!("{:.2}", value)
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};
    use rust_decimal::Decimal;

    use moveline_core::domain::booking::{
        Booking, BookingId, BookingSchedule, BookingStatus, CustomerDetails, ServiceDescriptor,
    };
    use moveline_core::domain::schedule::Slot;
    use moveline_core::domain::service::{Route, ServiceCategory};
    use moveline_core::domain::session::{CallId, CallSession};
    use moveline_core::pricing::{price_move, QuoteInput};

    use super::Templates;

    fn booking_fixture() -> Booking {
        let now = Utc::now();
        Booking {
            id: BookingId("MB-7KQ2XN".to_owned()),
            customer: CustomerDetails {
                name: "Jordan Avery".to_owned(),
                phone: "+15125550123".to_owned(),
                email: "jordan@example.com".to_owned(),
            },
            schedule: BookingSchedule {
                date: NaiveDate::from_ymd_opt(2026, 3, 20).expect("valid date"),
                slot: Slot::Morning,
            },
            service: ServiceDescriptor::new(ServiceCategory::FullService, 2),
            route: Route {
                pickup: "100 Elm St, Austin".to_owned(),
                delivery: "200 Oak St, Round Rock".to_owned(),
                distance_miles: Decimal::from(18),
                drive_time_minutes: 25,
            },
            price: price_move(&QuoteInput {
                category: ServiceCategory::FullService,
                distance_miles: Decimal::from(18),
                crew_size: 2,
                hours: 4,
            }),
            status: BookingStatus::Confirmed,
            source: "voice".to_owned(),
            originating_call_id: CallId("CA-1".to_owned()),
            calendar_synced: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn confirmation_email_carries_reference_and_window() {
        let templates = Templates::new().expect("templates compile");
        let body = templates.booking_confirmation_email(&booking_fixture()).expect("render");

        assert!(body.contains("MB-7KQ2XN"));
        assert!(body.contains("8-9 AM"));
        assert!(body.contains("March 20, 2026"));
    }

    #[test]
    fn quote_email_omits_travel_fee_for_full_service() {
        let templates = Templates::new().expect("templates compile");
        let full = price_move(&QuoteInput {
            category: ServiceCategory::FullService,
            distance_miles: Decimal::from(10),
            crew_size: 2,
            hours: 4,
        });
        let body = templates.quote_email(&full).expect("render");
        assert!(!body.contains("Travel fee"));
        assert!(body.contains("912.00"));

        let labor = price_move(&QuoteInput {
            category: ServiceCategory::LaborOnly,
            distance_miles: Decimal::from(10),
            crew_size: 2,
            hours: 3,
        });
        let body = templates.quote_email(&labor).expect("render");
        assert!(body.contains("Travel fee"));
        assert!(body.contains("32.00"));
    }

    #[test]
    fn transcript_email_lists_turns_in_order() {
        let templates = Templates::new().expect("templates compile");
        let mut session = CallSession::start(CallId("CA-55".to_owned()), "+15125550155", Utc::now());
        let outcome = moveline_core::script::states::TransitionOutcome::advance(
            moveline_core::script::states::CallStage::Greeting,
            moveline_core::script::states::CallStage::MainMenu,
        );
        session.apply_outcome(&outcome, "call-start", None, Utc::now()).expect("apply");

        let body = templates.transcript_email(&session).expect("render");
        assert!(body.contains("CA-55"));
        assert!(body.contains("greeting -> main-menu"));
    }
}
